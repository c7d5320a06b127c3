use cloudcar_core::db::{migrate_db, open_db, open_db_in_memory};
use cloudcar_core::{
    CustomerPatch, CustomerRepository, CustomerService, NewCustomer, RepoError,
    SqliteCustomerRepository, StateCode, ValidationError,
};
use rust_decimal::Decimal;
use rusqlite::Connection;
use std::str::FromStr;
use std::sync::{Arc, Barrier};
use std::thread;

fn ana() -> NewCustomer {
    NewCustomer {
        nome: "Ana Souza".to_string(),
        email: "ana@example.com".to_string(),
        telefone: "11999990000".to_string(),
        cpf: "12345678901".to_string(),
        cidade: Some("Campinas".to_string()),
        estado: Some("SP".to_string()),
        renda: Some(Decimal::from_str("8500.5").unwrap()),
    }
}

fn customer_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM customers;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();

    let created = repo.create_customer(&ana()).unwrap();
    let loaded = repo.get_customer(created.id).unwrap().unwrap();

    assert_eq!(loaded.name, "Ana Souza");
    assert_eq!(loaded.tax_id, "12345678901");
    assert_eq!(loaded.state, Some(StateCode::SaoPaulo));
    assert_eq!(loaded.income.unwrap().to_string(), "8500.50");
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn duplicate_email_is_rejected_and_leaves_one_row() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
        repo.create_customer(&ana()).unwrap();

        let mut other = ana();
        other.cpf = "98765432100".to_string();
        let err = repo.create_customer(&other).unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { field: "email" }));
    }
    assert_eq!(customer_count(&conn), 1);
}

#[test]
fn email_uniqueness_ignores_case() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
        repo.create_customer(&ana()).unwrap();

        let mut shouting = ana();
        shouting.email = "ANA@Example.COM".to_string();
        shouting.cpf = "98765432100".to_string();
        let err = repo.create_customer(&shouting).unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { field: "email" }));
    }
    assert_eq!(customer_count(&conn), 1);
}

#[test]
fn duplicate_tax_id_is_rejected_and_leaves_one_row() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
        repo.create_customer(&ana()).unwrap();

        let mut other = ana();
        other.email = "other@example.com".to_string();
        let err = repo.create_customer(&other).unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { field: "cpf" }));
    }
    assert_eq!(customer_count(&conn), 1);
}

#[test]
fn invalid_payloads_are_rejected_before_writing() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();

        let mut bad_state = ana();
        bad_state.estado = Some("XX".to_string());
        assert!(matches!(
            repo.create_customer(&bad_state),
            Err(RepoError::Validation(ValidationError::InvalidStateCode(_)))
        ));

        let mut bad_cpf = ana();
        bad_cpf.cpf = "123".to_string();
        assert!(matches!(
            repo.create_customer(&bad_cpf),
            Err(RepoError::Validation(ValidationError::InvalidTaxId(_)))
        ));

        let mut missing_name = ana();
        missing_name.nome = "   ".to_string();
        assert!(matches!(
            repo.create_customer(&missing_name),
            Err(RepoError::Validation(ValidationError::Required("nome")))
        ));
    }
    assert_eq!(customer_count(&conn), 0);
}

#[test]
fn list_returns_customers_in_insertion_order() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();

    let first = repo.create_customer(&ana()).unwrap();
    let mut bruno = ana();
    bruno.nome = "Bruno Lima".to_string();
    bruno.email = "bruno@example.com".to_string();
    bruno.cpf = "98765432100".to_string();
    let second = repo.create_customer(&bruno).unwrap();

    let ids: Vec<i64> = repo
        .list_customers()
        .unwrap()
        .into_iter()
        .map(|customer| customer.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn update_patch_changes_only_supplied_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
    let created = repo.create_customer(&ana()).unwrap();

    let patch = CustomerPatch {
        telefone: Some("11888880000".to_string()),
        cidade: Some(None),
        ..CustomerPatch::default()
    };
    let updated = repo.update_customer(created.id, &patch).unwrap();

    assert_eq!(updated.phone, "11888880000");
    assert_eq!(updated.city, None);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.state, created.state);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn update_missing_customer_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();

    let err = repo
        .update_customer(404, &CustomerPatch::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 404, .. }));
}

#[test]
fn rejected_update_rolls_back_and_releases_the_write_lock() {
    let mut conn = open_db_in_memory().unwrap();
    let bruno = {
        let mut repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
        repo.create_customer(&ana()).unwrap();

        let mut bruno = ana();
        bruno.email = "bruno@example.com".to_string();
        bruno.cpf = "98765432100".to_string();
        let bruno = repo.create_customer(&bruno).unwrap();

        let patch = CustomerPatch {
            nome: Some("Bruno Renamed".to_string()),
            email: Some("ana@example.com".to_string()),
            ..CustomerPatch::default()
        };
        assert!(matches!(
            repo.update_customer(bruno.id, &patch),
            Err(RepoError::Duplicate { field: "email" })
        ));
        bruno
    };

    assert!(conn.is_autocommit());
    let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
    let stored = repo.get_customer(bruno.id).unwrap().unwrap();
    assert_eq!(stored, bruno);
}

#[test]
fn find_or_create_is_idempotent_on_tax_id() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let service = CustomerService::new(SqliteCustomerRepository::try_new(&mut conn).unwrap());

        let first = service.find_or_create_customer(&ana()).unwrap();
        assert!(first.created);

        let mut again = ana();
        again.nome = "Ana S.".to_string();
        let second = service.find_or_create_customer(&again).unwrap();
        assert!(!second.created);
        assert_eq!(second.customer.id, first.customer.id);
        assert_eq!(second.customer.name, "Ana Souza");
    }
    assert_eq!(customer_count(&conn), 1);
}

#[test]
fn concurrent_find_or_create_yields_a_single_customer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloudcar.db");
    migrate_db(&path).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                let repo = SqliteCustomerRepository::try_new(&mut conn).unwrap();
                barrier.wait();
                repo.find_or_create_customer(&ana()).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(outcomes[0].customer.id, outcomes[1].customer.id);
    assert_eq!(outcomes.iter().filter(|outcome| outcome.created).count(), 1);

    let conn = open_db(&path).unwrap();
    assert_eq!(customer_count(&conn), 1);
}

#[test]
fn service_get_missing_customer_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&mut conn).unwrap());

    let err = service.get_customer(7).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 7, .. }));
    assert_eq!(err.kind(), cloudcar_core::ErrorKind::NotFound);
}
