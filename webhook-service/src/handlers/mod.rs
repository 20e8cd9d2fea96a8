pub mod webhook_handlers;
