use cloudcar_core::db::open_db_in_memory;
use cloudcar_core::{
    CustomerRepository, FinancingService, InstallmentTerm, NewCustomer, NewFinancingRequest,
    NewSale, NewTestDrive, SaleService, SqliteCustomerRepository, SqliteFinancingRepository,
    SqliteSaleRepository, SqliteTestDriveRepository, TestDriveRepository, TestDriveService,
};
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde_json::Value;

fn seed_customer(conn: &mut Connection) -> i64 {
    let repo = SqliteCustomerRepository::try_new(conn).unwrap();
    repo.create_customer(&NewCustomer {
        nome: "Carla Dias".to_string(),
        email: "carla@example.com".to_string(),
        telefone: "21988887777".to_string(),
        cpf: "11122233344".to_string(),
        estado: Some("RJ".to_string()),
        ..NewCustomer::default()
    })
    .unwrap()
    .id
}

#[test]
fn test_drive_list_inlines_customer() {
    let mut conn = open_db_in_memory().unwrap();
    let customer_id = seed_customer(&mut conn);

    let service = TestDriveService::new(SqliteTestDriveRepository::try_new(&conn).unwrap());
    let booking = service
        .book_test_drive(&NewTestDrive {
            cliente_id: Some(customer_id),
            data: "2026-11-02".to_string(),
            horario: "14:30".to_string(),
            mensagem: Some("SUV".to_string()),
        })
        .unwrap();

    let listed = service.list_test_drives().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].test_drive, booking);
    assert_eq!(listed[0].customer.name, "Carla Dias");

    let json = serde_json::to_value(&listed[0]).unwrap();
    assert_eq!(json["data"], "2026-11-02");
    assert_eq!(json["horario"], "14:30:00");
    assert_eq!(json["clienteId"], customer_id);
    assert_eq!(json["Cliente"]["nome"], "Carla Dias");
    assert_eq!(json["Cliente"]["cpf"], "11122233344");
    assert_eq!(json["Cliente"]["estado"], "RJ");
}

#[test]
fn test_drive_get_reads_back_normalized_time() {
    let mut conn = open_db_in_memory().unwrap();
    let customer_id = seed_customer(&mut conn);
    let repo = SqliteTestDriveRepository::try_new(&conn).unwrap();

    let booking = repo
        .create_test_drive(&NewTestDrive {
            cliente_id: Some(customer_id),
            data: "2026-12-24".to_string(),
            horario: "08:05:30".to_string(),
            mensagem: Some("  ".to_string()),
        })
        .unwrap();

    let loaded = repo.get_test_drive(booking.id).unwrap().unwrap();
    assert_eq!(loaded.time.to_string(), "08:05:30");
    assert_eq!(loaded.message, None);
    assert!(repo.get_test_drive(booking.id + 1).unwrap().is_none());
}

#[test]
fn financing_list_inlines_customer_and_serializes_money_as_strings() {
    let mut conn = open_db_in_memory().unwrap();
    let customer_id = seed_customer(&mut conn);

    let service = FinancingService::new(SqliteFinancingRepository::try_new(&mut conn).unwrap());
    let financing = service
        .submit_financing(&NewFinancingRequest {
            cliente_id: Some(customer_id),
            valor_veiculo: Some(Decimal::new(8_999_999, 2)),
            valor_entrada: Some(Decimal::from(10_000)),
            parcelas: Some(36),
        })
        .unwrap();
    assert_eq!(financing.installments, InstallmentTerm::Months36);

    let listed = service.list_financing().unwrap();
    let json = serde_json::to_value(&listed).unwrap();
    assert_eq!(json[0]["valorVeiculo"], "89999.99");
    assert_eq!(json[0]["valorEntrada"], "10000.00");
    assert_eq!(json[0]["parcelas"], 36);
    assert_eq!(json[0]["Cliente"]["email"], "carla@example.com");
}

#[test]
fn sale_list_inlines_financing_or_null() {
    let mut conn = open_db_in_memory().unwrap();
    let customer_id = seed_customer(&mut conn);
    let financing_id = {
        let service =
            FinancingService::new(SqliteFinancingRepository::try_new(&mut conn).unwrap());
        service
            .submit_financing(&NewFinancingRequest {
                cliente_id: Some(customer_id),
                valor_veiculo: Some(Decimal::from(75_000)),
                valor_entrada: Some(Decimal::from(15_000)),
                parcelas: Some(60),
            })
            .unwrap()
            .id
    };

    let mut service = SaleService::new(SqliteSaleRepository::try_new(&mut conn).unwrap());
    let financed = service
        .record_sale(&NewSale {
            cliente_id: Some(customer_id),
            financiamento_id: Some(financing_id),
            valor_total: Some(Decimal::from(75_000)),
            forma_pagamento: "Financiado".to_string(),
            ..NewSale::default()
        })
        .unwrap();
    let cash = service
        .record_sale(&NewSale {
            cliente_id: Some(customer_id),
            valor_total: Some(Decimal::from(42_000)),
            forma_pagamento: "À vista".to_string(),
            observacoes: Some("pix".to_string()),
            ..NewSale::default()
        })
        .unwrap();

    let listed = service.list_sales().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].sale.id, financed.id);
    assert_eq!(
        listed[0].financing.as_ref().map(|financing| financing.id),
        Some(financing_id)
    );
    assert_eq!(listed[1].sale.id, cash.id);
    assert!(listed[1].financing.is_none());

    let json: Value = serde_json::to_value(&listed).unwrap();
    assert_eq!(json[0]["Financiamento"]["parcelas"], 60);
    assert_eq!(json[0]["Cliente"]["nome"], "Carla Dias");
    assert!(json[1]["Financiamento"].is_null());
    assert_eq!(json[1]["valorTotal"], "42000.00");
    assert_eq!(json[1]["formaPagamento"], "À vista");
    assert_eq!(json[1]["observacoes"], "pix");
    assert!(json[1]["dataVenda"].is_string());
}

#[test]
fn sale_get_returns_not_found_for_unknown_id() {
    let mut conn = open_db_in_memory().unwrap();
    let service = SaleService::new(SqliteSaleRepository::try_new(&mut conn).unwrap());

    assert_eq!(
        service.get_sale(12).unwrap_err().kind(),
        cloudcar_core::ErrorKind::NotFound
    );
}
