use emrs_core::db::open_db_in_memory;
use emrs_core::{
    AuditInterceptor, AuditQuery, AuditStatus, AuditStore, AuditedOperation, BatchConfig,
    CallerIdentity, Department, DepartmentService, Employee, EmployeePatch, EmployeeService,
    EmploymentStatus, InvocationContext, Patch, RepoError, SqliteAuditStore,
};
use rusqlite::Connection;
use std::net::{IpAddr, Ipv4Addr};

fn origin() -> Option<IpAddr> {
    Some(IpAddr::V4(Ipv4Addr::new(192, 168, 10, 4)))
}

fn ada() -> InvocationContext {
    InvocationContext::authenticated(
        CallerIdentity::new("6c1f-ada").with_claim("preferred_username", "ada"),
        origin(),
    )
}

fn all_records(conn: &Connection) -> Vec<emrs_core::AuditRecord> {
    SqliteAuditStore::new(conn)
        .list(&AuditQuery::default())
        .unwrap()
}

fn employee(number: i64, department_id: i64) -> Employee {
    Employee {
        id: None,
        full_name: format!("Employee {number}"),
        employee_number: number,
        job_title: "Clerk".to_string(),
        employment_status: EmploymentStatus::PartTime,
        address: "1 Quay Street".to_string(),
        phone: "555-0000".to_string(),
        email: format!("clerk{number}@example.org"),
        department_id,
        created_at: None,
        updated_at: None,
    }
}

fn department_id(conn: &Connection) -> i64 {
    DepartmentService::new(conn, BatchConfig::default())
        .create_departments(&ada(), vec![Department::new("Operations")])
        .unwrap()[0]
        .id
        .unwrap()
}

#[test]
fn successful_call_leaves_one_success_record() {
    let conn = open_db_in_memory().unwrap();
    let department_id = department_id(&conn);
    let service = EmployeeService::new(&conn, BatchConfig::default());

    let created = service
        .create_employees_in_batch(&ada(), vec![employee(1, department_id)])
        .unwrap();
    assert_eq!(created.len(), 1);

    let records = all_records(&conn);
    assert_eq!(records.len(), 2);
    let record = &records[1];
    assert_eq!(record.operation, "Create employees in batch");
    assert_eq!(record.method, "create_employees_in_batch");
    assert_eq!(record.caller_id, "6c1f-ada");
    assert_eq!(record.caller_name, "ada");
    assert_eq!(record.ip_address, "192.168.10.4");
    assert_eq!(record.status, AuditStatus::Success);
    assert!(record.updated_at >= record.created_at);
}

#[test]
fn unlabeled_operation_is_recorded_under_its_method_name() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(&conn, BatchConfig::default());

    let found = service
        .find_employees(&InvocationContext::anonymous(None), &[1, 2])
        .unwrap();
    assert!(found.is_empty());

    let records = all_records(&conn);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "find_employees");
    assert_eq!(records[0].caller_id, "Anonymous");
    assert_eq!(records[0].caller_name, "Anonymous");
}

#[test]
fn failing_call_records_failure_and_returns_original_error() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(&conn, BatchConfig::default());

    let err = service
        .update_employees_in_batch(&ada(), &[1], EmployeePatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NoUpdatableFields { table: "employees" }
    ));

    let records = all_records(&conn);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "Update employees in batch");
    assert_eq!(records[0].status, AuditStatus::Failure);
}

#[test]
fn empty_update_id_list_is_a_validation_failure() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(&conn, BatchConfig::default());
    let patch = EmployeePatch {
        job_title: Patch::Set("Lead".to_string()),
        ..EmployeePatch::default()
    };

    let err = service
        .update_employees_in_batch(&ada(), &[], patch)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(all_records(&conn)[0].status, AuditStatus::Failure);
}

#[test]
fn store_failure_rolls_back_business_writes_but_keeps_the_audit_record() {
    let conn = open_db_in_memory().unwrap();
    let department_id = department_id(&conn);
    let service = EmployeeService::new(&conn, BatchConfig::default());

    let err = service
        .create_employees_in_batch(
            &ada(),
            vec![
                employee(7, department_id),
                employee(8, department_id),
                employee(7, department_id),
            ],
        )
        .unwrap_err();
    assert!(err.is_constraint_violation());

    let page = service.employees_page(0, 10).unwrap();
    assert_eq!(page.total_elements, 0);

    let failures = SqliteAuditStore::new(&conn)
        .list(&AuditQuery {
            status: Some(AuditStatus::Failure),
            ..AuditQuery::default()
        })
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].method, "create_employees_in_batch");
}

#[test]
fn started_record_exists_while_the_operation_runs() {
    let conn = open_db_in_memory().unwrap();
    let interceptor = AuditInterceptor::new(SqliteAuditStore::new(&conn));

    let result: Result<usize, RepoError> = interceptor.run(
        &ada(),
        &AuditedOperation::new("inspect_audit_state").labeled("Inspect audit state"),
        || {
            let during = all_records(&conn);
            assert_eq!(during.len(), 1);
            assert_eq!(during[0].status, AuditStatus::Started);
            Ok(during.len())
        },
    );

    assert_eq!(result.unwrap(), 1);
    let after = all_records(&conn);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].status, AuditStatus::Success);
}

#[test]
fn department_delete_with_no_ids_is_audited_noop() {
    let conn = open_db_in_memory().unwrap();
    let service = DepartmentService::new(&conn, BatchConfig::default());

    let result = service.delete_departments(&ada(), &[]).unwrap();
    assert_eq!(result.affected_records, 0);
    assert_eq!(result.message, "No department IDs provided.");

    let records = all_records(&conn);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "delete_departments");
    assert_eq!(records[0].status, AuditStatus::Success);
}

#[test]
fn terminal_update_is_applied_only_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAuditStore::new(&conn);
    let mut record =
        emrs_core::AuditRecord::started("u", "u", "Op", "op", "127.0.0.1", 1_000);
    store.save(&mut record).unwrap();

    record.complete(AuditStatus::Success, 2_000).unwrap();
    store.update(&record).unwrap();

    let mut stale = record.clone();
    stale.status = AuditStatus::Failure;
    assert!(store.update(&stale).is_err());
    assert_eq!(all_records(&conn)[0].status, AuditStatus::Success);
}

#[test]
fn reporting_filters_by_caller_and_time_range() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAuditStore::new(&conn);
    for (caller, created_at) in [("a", 100), ("b", 200), ("a", 300)] {
        let mut record =
            emrs_core::AuditRecord::started(caller, caller, "Op", "op", "10.0.0.1", created_at);
        store.save(&mut record).unwrap();
    }

    let by_caller = store
        .list(&AuditQuery {
            caller_id: Some("a".to_string()),
            created_from: Some(150),
            ..AuditQuery::default()
        })
        .unwrap();
    assert_eq!(by_caller.len(), 1);
    assert_eq!(by_caller[0].created_at, 300);
}

#[test]
fn update_with_invalid_email_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let department_id = department_id(&conn);
    let service = EmployeeService::new(&conn, BatchConfig::default());
    let created = service
        .create_employees_in_batch(&ada(), vec![employee(3, department_id)])
        .unwrap();
    let id = created[0].id.unwrap();

    let patch = EmployeePatch {
        email: Patch::Set("x".to_string()),
        ..EmployeePatch::default()
    };
    let err = service
        .update_employees_in_batch(&ada(), &[id], patch)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let stored = service.find_employees(&ada(), &[id]).unwrap();
    assert_eq!(stored[0].email, "clerk3@example.org");
}
