// tests/concurrency.rs
//
// Escritores concorrentes no mesmo par (produto, local). O armazenamento em
// memória serializa as unidades de trabalho do mesmo jeito que o FOR UPDATE
// faz no Postgres, então a aritmética final tem que fechar exata.

mod common;

use common::{seed_location, seed_product, seed_user, test_state};
use estoque_api::{
    common::error::AppError,
    models::inventory::{MovementFilter, MovementKind, StockFilter},
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn saidas_concorrentes_nunca_vendem_mais_que_o_saldo() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CONC-001", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 100, None)
        .await
        .unwrap();

    // 20 tarefas tentando tirar 10 cada; só 10 cabem.
    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = state.ledger_service.clone();
        let product_id = product.id;
        let location_id = location.id;
        handles.push(tokio::spawn(async move {
            ledger
                .record_movement(user_id, product_id, location_id, MovementKind::Out, 10, None)
                .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("erro inesperado: {other:?}"),
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(insufficient, 10);

    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    assert_eq!(stock[0].quantity, 0);

    // Histórico: 1 entrada + exatamente as saídas que foram aceitas.
    let page = state
        .ledger_service
        .list_movements(MovementFilter {
            limit: Some(100),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn entradas_concorrentes_somam_sem_perder_nenhuma() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CONC-002", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = state.ledger_service.clone();
        let product_id = product.id;
        let location_id = location.id;
        handles.push(tokio::spawn(async move {
            ledger
                .record_movement(user_id, product_id, location_id, MovementKind::In, 5, None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    assert_eq!(stock[0].quantity, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transferencias_concorrentes_preservam_o_total() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CONC-003", 0).await;
    let origin = seed_location(store.as_ref(), "DEP-01").await;
    let destination = seed_location(store.as_ref(), "LOJA-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, origin.id, MovementKind::In, 40, None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ledger = state.ledger_service.clone();
        let product_id = product.id;
        let origin_id = origin.id;
        let destination_id = destination.id;
        handles.push(tokio::spawn(async move {
            ledger
                .transfer_stock(user_id, product_id, origin_id, destination_id, 10, None)
                .await
        }));
    }

    let mut moved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => moved += 10,
            Err(AppError::InsufficientStock { .. }) => {}
            Err(other) => panic!("erro inesperado: {other:?}"),
        }
    }
    assert_eq!(moved, 40);

    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    let total: i64 = stock.iter().map(|s| s.quantity).sum();
    assert_eq!(total, 40);
    let destination_qty = stock
        .iter()
        .find(|s| s.location_id == destination.id)
        .map(|s| s.quantity)
        .unwrap_or(0);
    assert_eq!(destination_qty, 40);
}
