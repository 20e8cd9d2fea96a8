use serde_json::json;

use rsvper_shared::error::ServiceError;
use rsvper_shared::models::{SubEvent, ENTIRE_FAMILY};
use rsvper_shared::test_utils::mock_row_store::MockRowStore;
use rsvper_shared::test_utils::test_logging::init_test_logging;

use super::seeded_store;
use crate::directory::{find_by_invite_code, INVITED_FAMILY_TABLE};

#[tokio::test]
async fn finds_family_on_its_natural_row() {
    init_test_logging();
    let store = seeded_store();

    let found = find_by_invite_code(&store, 2).await.unwrap();

    assert_eq!(found.row_number, 3);
    assert_eq!(found.family.invite_code, 2);
    assert_eq!(found.family.family_name, "Mehta Family");
    assert_eq!(found.family.display_name, "Ravi");
    assert_eq!(found.family.invited(SubEvent::Vidhi), 5);
    assert_eq!(found.family.invited(SubEvent::Garba), 0);
    assert_eq!(found.family.invited(SubEvent::Wedding), 3);
}

#[tokio::test]
async fn falls_back_to_scanning_for_out_of_order_rows() {
    init_test_logging();
    let store = seeded_store();

    let found = find_by_invite_code(&store, 300).await.unwrap();

    assert_eq!(found.row_number, 5);
    assert_eq!(found.family.display_name, "Meera");
    assert_eq!(found.family.invited(SubEvent::Wedding), ENTIRE_FAMILY);
}

#[tokio::test]
async fn direct_row_mismatch_still_finds_moved_family() {
    init_test_logging();
    // Code 1's natural row is occupied by somebody else; the scan recovers it.
    let store = MockRowStore::new().with_table(
        INVITED_FAMILY_TABLE,
        vec![
            vec![json!("Origin"), json!("Family"), json!("Invitees"), json!("Code")],
            vec![json!("US"), json!("Shah"), json!("Anand"), json!("9"), json!("4")],
            vec![json!("US"), json!("Mehta"), json!("Ravi"), json!("1"), json!("2")],
        ],
    );

    let found = find_by_invite_code(&store, 1).await.unwrap();
    assert_eq!(found.row_number, 3);
    assert_eq!(found.family.display_name, "Ravi");

    let found = find_by_invite_code(&store, 9).await.unwrap();
    assert_eq!(found.row_number, 2);
    assert_eq!(found.family.display_name, "Anand");
}

#[tokio::test]
async fn repeated_lookups_are_idempotent() {
    init_test_logging();
    let store = seeded_store();

    let first = find_by_invite_code(&store, 1).await.unwrap();
    let second = find_by_invite_code(&store, 1).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_code_is_a_distinct_not_found() {
    init_test_logging();
    let store = seeded_store();

    assert!(matches!(
        find_by_invite_code(&store, 99).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn store_read_failure_surfaces_as_internal() {
    init_test_logging();
    let store = MockRowStore::new_error();

    assert!(matches!(
        find_by_invite_code(&store, 2).await,
        Err(ServiceError::Internal(_))
    ));
}
