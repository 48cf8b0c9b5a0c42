use emrs_core::db::open_db_in_memory;
use emrs_core::{
    build_update, BatchConfig, BatchWriter, Department, Employee, EmployeePatch,
    EmploymentStatus, PageReader, Patch, RecordId, RecordStore, RepoError, SqliteSession,
    UpdateTemplate,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn seed_department(conn: &Connection) -> RecordId {
    let mut session = SqliteSession::new(conn);
    let created = BatchWriter::new(&mut session, BatchConfig::default())
        .insert_batch(vec![Department::new("Engineering")])
        .unwrap();
    created[0].id.unwrap()
}

fn employee(number: i64, department_id: RecordId) -> Employee {
    Employee {
        id: None,
        full_name: format!("Employee {number}"),
        employee_number: number,
        job_title: "Engineer".to_string(),
        employment_status: EmploymentStatus::FullTime,
        address: format!("{number} Harbour Road"),
        phone: format!("555-{number:04}"),
        email: format!("e{number}@example.org"),
        department_id,
        created_at: None,
        updated_at: None,
    }
}

fn seed_employees(conn: &Connection, n: i64) -> Vec<Employee> {
    let department_id = seed_department(conn);
    let mut session = SqliteSession::new(conn);
    BatchWriter::new(&mut session, BatchConfig::default())
        .insert_batch((1..=n).map(|number| employee(number, department_id)).collect())
        .unwrap()
}

#[test]
fn insert_batch_assigns_store_ids_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let inserted = seed_employees(&conn, 23);

    let ids: HashSet<RecordId> = inserted.iter().map(|e| e.id.unwrap()).collect();
    assert_eq!(ids.len(), 23);

    let mut session = SqliteSession::new(&conn);
    let loaded = BatchWriter::new(&mut session, BatchConfig::default())
        .find_by_ids::<Employee>(&[inserted[0].id.unwrap()])
        .unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].full_name, "Employee 1");
    let created_at = loaded[0].created_at.unwrap();
    assert!(created_at > 0);
    assert_eq!(loaded[0].updated_at, Some(created_at));
}

#[test]
fn page_over_25_records_reports_three_pages_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, 25);
    let mut session = SqliteSession::new(&conn);
    let mut reader = PageReader::new(&mut session);

    let first = reader.page::<Employee>(0, 10).unwrap();
    assert_eq!(first.total_elements, 25);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.content.len(), 10);
    let ids: Vec<RecordId> = first.content.iter().map(|e| e.id.unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    let last = reader.page::<Employee>(2, 10).unwrap();
    assert_eq!(last.content.len(), 5);
    assert!(last.content[0].id > first.content[9].id);

    let beyond = reader.page::<Employee>(3, 10).unwrap();
    assert!(beyond.content.is_empty());
    assert_eq!(beyond.total_pages, 3);
}

#[test]
fn page_rejects_invalid_bounds() {
    let conn = open_db_in_memory().unwrap();
    let mut session = SqliteSession::new(&conn);
    let mut reader = PageReader::new(&mut session);

    assert!(matches!(
        reader.page::<Employee>(-1, 10),
        Err(RepoError::InvalidPageRequest { page: -1, size: 10 })
    ));
    assert!(matches!(
        reader.page::<Employee>(0, 0),
        Err(RepoError::InvalidPageRequest { .. })
    ));
}

#[test]
fn delete_removes_exactly_the_listed_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO departments (id, name, created_at, updated_at) VALUES
            (19887, 'Archive', 0, 0),
            (18995, 'Payroll', 0, 0),
            (7, 'Legal', 0, 0);",
    )
    .unwrap();

    let mut session = SqliteSession::new(&conn);
    let mut writer = BatchWriter::new(&mut session, BatchConfig::default());
    assert_eq!(writer.delete_batch::<Department>(&[19887, 18995]).unwrap(), 2);

    let remaining = writer.find_by_ids::<Department>(&[19887, 18995, 7]).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Legal");
}

#[test]
fn delete_of_missing_ids_returns_zero() {
    let conn = open_db_in_memory().unwrap();
    let mut session = SqliteSession::new(&conn);

    let affected = BatchWriter::new(&mut session, BatchConfig::default())
        .delete_batch::<Employee>(&[1])
        .unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn find_by_ids_ignores_duplicates_and_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let inserted = seed_employees(&conn, 3);
    let first = inserted[0].id.unwrap();

    let mut session = SqliteSession::new(&conn);
    let found = BatchWriter::new(&mut session, BatchConfig::default())
        .find_by_ids::<Employee>(&[first, first, 999_999])
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(first));
}

#[test]
fn partial_update_only_touches_present_columns() {
    let conn = open_db_in_memory().unwrap();
    let inserted = seed_employees(&conn, 12);
    let ids: Vec<RecordId> = inserted.iter().take(11).map(|e| e.id.unwrap()).collect();

    let patch = EmployeePatch {
        job_title: Patch::Set("Principal Engineer".to_string()),
        employment_status: Patch::Set(EmploymentStatus::FixedTerm),
        ..EmployeePatch::default()
    };
    let update = build_update::<Employee>(&patch.into_template()).unwrap();

    let mut session = SqliteSession::new(&conn);
    let mut writer = BatchWriter::new(&mut session, BatchConfig::default());
    assert_eq!(writer.apply_batched_update(&update, &ids).unwrap(), 11);

    let all: Vec<Employee> = writer
        .find_by_ids(&inserted.iter().map(|e| e.id.unwrap()).collect::<Vec<_>>())
        .unwrap();
    for (before, after) in inserted.iter().zip(sorted_by_id(all)) {
        assert_eq!(after.full_name, before.full_name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.address, before.address);
        if ids.contains(&after.id.unwrap()) {
            assert_eq!(after.job_title, "Principal Engineer");
            assert_eq!(after.employment_status, EmploymentStatus::FixedTerm);
        } else {
            assert_eq!(after.job_title, "Engineer");
            assert_eq!(after.employment_status, EmploymentStatus::FullTime);
        }
    }
}

#[test]
fn explicit_null_on_required_column_surfaces_store_error() {
    let conn = open_db_in_memory().unwrap();
    let inserted = seed_employees(&conn, 1);

    let mut template = UpdateTemplate::new("employees");
    template.set_null("phone");
    let update = build_update::<Employee>(&template).unwrap();

    let mut session = SqliteSession::new(&conn);
    let err = BatchWriter::new(&mut session, BatchConfig::default())
        .apply_batched_update(&update, &[inserted[0].id.unwrap()])
        .unwrap_err();
    assert!(matches!(err, RepoError::Store(_)));
}

#[test]
fn constraint_violation_propagates_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let department_id = seed_department(&conn);

    let mut session = SqliteSession::new(&conn);
    let err = BatchWriter::new(&mut session, BatchConfig::default())
        .insert_batch(vec![employee(1, department_id), employee(1, department_id)])
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

fn sorted_by_id(mut employees: Vec<Employee>) -> Vec<Employee> {
    employees.sort_by_key(|e| e.id);
    employees
}

#[test]
fn page_serializes_with_totals() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, 3);
    let mut session = SqliteSession::new(&conn);
    let page = PageReader::new(&mut session)
        .page::<Employee>(0, 2)
        .unwrap();

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["total_elements"], 3);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["content"][0]["employment_status"], "FULL_TIME");
}

#[test]
fn insert_batch_keeps_ids_of_writes_queued_earlier_on_the_session() {
    let conn = open_db_in_memory().unwrap();
    let mut session = SqliteSession::new(&conn);
    session.persist(&Department::new("Earlier")).unwrap();

    let inserted = BatchWriter::new(&mut session, BatchConfig::default())
        .insert_batch(vec![Department::new("A"), Department::new("B")])
        .unwrap();
    drop(session);

    let names_by_id: Vec<(RecordId, String)> = conn
        .prepare("SELECT id, name FROM departments ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names_by_id.len(), 3);
    assert_eq!(names_by_id[0].1, "Earlier");
    for department in &inserted {
        let stored = names_by_id
            .iter()
            .find(|(id, _)| Some(*id) == department.id)
            .unwrap();
        assert_eq!(stored.1, department.name);
    }
}

#[test]
fn page_size_near_i64_max_returns_everything_on_one_page() {
    let conn = open_db_in_memory().unwrap();
    seed_employees(&conn, 2);
    let mut session = SqliteSession::new(&conn);

    let page = PageReader::new(&mut session)
        .page::<Department>(0, i64::MAX)
        .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.total_pages, 1);
}
