// These tests need a PostgreSQL instance with the el_reenvio schema loaded
// and DATABASE_URL pointing at it, mirroring the production storage layout.

use diesel::prelude::*;
use dotenv::dotenv;
use el_reenvio::db::tasks::NewTask;
use el_reenvio::db::{approvals, duplicates, tasks};
use el_reenvio::models::pending_approval::{APPROVAL_APPROVED, APPROVAL_REJECTED};
use serde_json::json;
use std::env;

fn establish_connection() -> PgConnection {
    dotenv().ok();

    let url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgConnection::establish(&url).unwrap_or_else(|_| panic!("Error connecting to {}", url))
}

fn create_task(conn: &mut PgConnection) -> i64 {
    let task = tasks::create(
        conn,
        NewTask {
            user_id: 1,
            name: "test relay".to_string(),
            task_type: "bot".to_string(),
        },
    )
    .unwrap();

    task.id
}

#[test]
#[ignore]
fn duplicate_record_counts_repeat_sightings() {
    let mut connection = establish_connection();

    connection.test_transaction::<_, diesel::result::Error, _>(|conn| {
        let task_id = create_task(conn);

        let first = duplicates::record_seen(conn, task_id, "hash-a")?;
        assert_eq!(first.times_seen, 1);

        let second = duplicates::record_seen(conn, task_id, "hash-a")?;
        assert_eq!(second.times_seen, 2);
        assert!(second.last_seen >= first.last_seen);

        let other = duplicates::record_seen(conn, task_id, "hash-b")?;
        assert_eq!(other.times_seen, 1);

        Ok(())
    });
}

#[test]
#[ignore]
fn approval_decision_is_idempotent() {
    let mut connection = establish_connection();

    connection.test_transaction::<_, diesel::result::Error, _>(|conn| {
        let task_id = create_task(conn);

        let approval = approvals::create(
            conn,
            task_id,
            -1001,
            5,
            json!({"text": "pending body"}),
        )?;
        assert!(approval.is_pending());

        let decided = approvals::decide(conn, approval.id, 7, APPROVAL_APPROVED)?;
        assert_eq!(decided, 1);

        // the second decision must match zero rows
        let repeated = approvals::decide(conn, approval.id, 8, APPROVAL_REJECTED)?;
        assert_eq!(repeated, 0);

        let stored = approvals::find(conn, approval.id).unwrap();
        assert_eq!(stored.status, APPROVAL_APPROVED);
        assert_eq!(stored.approved_by, Some(7));

        Ok(())
    });
}

#[test]
#[ignore]
fn default_settings_row_compiles_to_documented_defaults() {
    let mut connection = establish_connection();

    connection.test_transaction::<_, diesel::result::Error, _>(|conn| {
        let task_id = create_task(conn);

        let row = tasks::create_default_settings(conn, task_id)?;
        let compiled = el_reenvio::settings::CompiledSettings::from_row(&row);

        assert!(compiled.allow_text);
        assert!(!compiled.manual_mode);
        assert_eq!(compiled.delay_min, 0);

        Ok(())
    });
}
