// tests/ledger_scenarios.rs
//
// Cenários de negócio do livro-razão, rodando contra o armazenamento em
// memória. O que se testa aqui é a semântica das operações, não o SQL.

mod common;

use std::time::Duration;

use common::{seed_location, seed_product, seed_user, test_state, test_state_with_alerts};
use estoque_api::{
    common::error::AppError,
    db::LedgerStore,
    models::inventory::{MovementDirection, MovementFilter, MovementKind, StockFilter},
};

#[tokio::test]
async fn entrada_cria_saldo_e_registra_movimentacao() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-001", 10).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    let (movement, level) = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 50, None)
        .await
        .unwrap();

    assert_eq!(movement.kind, MovementKind::In);
    assert_eq!(movement.quantity, 50);
    assert_eq!(level.quantity, 50);
    // Thresholds herdados do produto na criação da linha.
    assert_eq!(level.min_stock_level, 10);

    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].quantity, 50);
    assert_eq!(stock[0].product_sku, "CAD-001");
}

#[tokio::test]
async fn saida_abaixo_do_minimo_dispara_alerta() {
    let (state, store, mut alerts) = test_state_with_alerts();
    let product = seed_product(store.as_ref(), "CAD-002", 10).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 20, None)
        .await
        .unwrap();

    let (_, level) = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::Out, 15, None)
        .await
        .unwrap();
    assert_eq!(level.quantity, 5);

    let alert = tokio::time::timeout(Duration::from_secs(1), alerts.recv())
        .await
        .expect("alerta não chegou a tempo")
        .expect("canal de alertas fechado");
    assert_eq!(alert.product_id, product.id);
    assert_eq!(alert.quantity, 5);
    assert_eq!(alert.min_stock_level, 10);
    assert!(!alert.out_of_stock);
}

#[tokio::test]
async fn saldo_zerado_dispara_alerta_de_zerado() {
    let (state, store, mut alerts) = test_state_with_alerts();
    let product = seed_product(store.as_ref(), "CAD-003", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 3, None)
        .await
        .unwrap();
    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::Out, 3, None)
        .await
        .unwrap();

    let alert = tokio::time::timeout(Duration::from_secs(1), alerts.recv())
        .await
        .expect("alerta não chegou a tempo")
        .expect("canal de alertas fechado");
    assert!(alert.out_of_stock);
    assert_eq!(alert.quantity, 0);

    // O par continua rastreado, agora com saldo zero.
    let zerados = state.ledger_service.out_of_stock(None).await.unwrap();
    assert_eq!(zerados.len(), 1);
    assert_eq!(zerados[0].product_id, product.id);
}

#[tokio::test]
async fn saida_sem_saldo_e_rejeitada_sem_efeitos() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-004", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 10, None)
        .await
        .unwrap();

    let err = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::Out, 25, None)
        .await
        .unwrap_err();
    match err {
        AppError::InsufficientStock {
            available,
            requested,
        } => {
            assert_eq!(available, 10);
            assert_eq!(requested, 25);
        }
        other => panic!("esperava InsufficientStock, veio {other:?}"),
    }

    // Nada mudou: saldo intacto e só a entrada no histórico.
    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    assert_eq!(stock[0].quantity, 10);

    let page = state
        .ledger_service
        .list_movements(MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn saida_de_par_nunca_movimentado_reporta_zero_disponivel() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-005", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    let err = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::Out, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock {
            available: 0,
            requested: 1
        }
    ));
}

#[tokio::test]
async fn tipos_de_transferencia_nao_entram_pela_movimentacao_simples() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-006", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    for kind in [
        MovementKind::TransferIn,
        MovementKind::TransferOut,
        MovementKind::Adjustment,
    ] {
        let err = state
            .ledger_service
            .record_movement(user_id, product.id, location.id, kind, 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMovement(_)));
    }
}

#[tokio::test]
async fn ajuste_grava_delta_com_direcao() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-007", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 50, None)
        .await
        .unwrap();

    // Contagem física achou 30: delta de -20 vira ADJUSTMENT/OUT.
    let (movement, level) = state
        .ledger_service
        .adjust_stock(user_id, product.id, location.id, 30, None)
        .await
        .unwrap();

    let movement = movement.expect("delta não nulo gera movimentação");
    assert_eq!(movement.kind, MovementKind::Adjustment);
    assert_eq!(movement.quantity, 20);
    assert_eq!(movement.direction, Some(MovementDirection::Out));
    assert_eq!(level.quantity, 30);
}

#[tokio::test]
async fn reaplicar_o_mesmo_ajuste_nao_gera_movimentacao() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-008", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .adjust_stock(user_id, product.id, location.id, 30, None)
        .await
        .unwrap();
    let (movement, level) = state
        .ledger_service
        .adjust_stock(user_id, product.id, location.id, 30, None)
        .await
        .unwrap();

    assert!(movement.is_none());
    assert_eq!(level.quantity, 30);

    // Primeiro ajuste (0 -> 30) é a única linha do histórico.
    let page = state
        .ledger_service
        .list_movements(MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn ajuste_para_zero_cria_par_rastreado_vazio() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-009", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    let (movement, level) = state
        .ledger_service
        .adjust_stock(user_id, product.id, location.id, 0, None)
        .await
        .unwrap();

    assert!(movement.is_none());
    assert_eq!(level.quantity, 0);

    let zerados = state.ledger_service.out_of_stock(None).await.unwrap();
    assert_eq!(zerados.len(), 1);
}

#[tokio::test]
async fn entrada_que_estoura_o_limite_de_saldo_e_rejeitada() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-015", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(
            user_id,
            product.id,
            location.id,
            MovementKind::In,
            i64::MAX,
            None,
        )
        .await
        .unwrap();

    // A soma estouraria o i64: rejeita como movimentação inválida,
    // nunca vira saldo negativo.
    let err = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidMovement(_)));

    let stock = state
        .ledger_service
        .list_stock(StockFilter::default())
        .await
        .unwrap();
    assert_eq!(stock[0].quantity, i64::MAX);

    let page = state
        .ledger_service
        .list_movements(MovementFilter::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn primeiro_toque_no_saldo_e_distinguivel_de_atualizacao() {
    let (_, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-016", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;

    let mut tx = store.begin().await.unwrap();
    let first = tx
        .find_or_create_level(product.id, location.id, 0, None)
        .await
        .unwrap();
    assert!(first.was_created());

    let second = tx
        .find_or_create_level(product.id, location.id, 0, None)
        .await
        .unwrap();
    assert!(!second.was_created());
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn produto_desativado_recusa_movimentacao() {
    let (state, store) = test_state();
    let product = seed_product(store.as_ref(), "CAD-010", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state.catalog_service.deactivate_product(product.id).await.unwrap();

    let err = state
        .ledger_service
        .record_movement(user_id, product.id, location.id, MovementKind::In, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidMovement(_)));
}

#[tokio::test]
async fn historico_filtra_por_tipo_e_produto() {
    let (state, store) = test_state();
    let product_a = seed_product(store.as_ref(), "CAD-011", 0).await;
    let product_b = seed_product(store.as_ref(), "CAD-012", 0).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    for product in [&product_a, &product_b] {
        state
            .ledger_service
            .record_movement(user_id, product.id, location.id, MovementKind::In, 10, None)
            .await
            .unwrap();
    }
    state
        .ledger_service
        .record_movement(user_id, product_a.id, location.id, MovementKind::Out, 4, None)
        .await
        .unwrap();

    let only_out = state
        .ledger_service
        .list_movements(MovementFilter {
            kind: Some(MovementKind::Out),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_out.pagination.total, 1);
    assert_eq!(only_out.data[0].quantity, 4);

    let only_b = state
        .ledger_service
        .list_movements(MovementFilter {
            product_id: Some(product_b.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_b.pagination.total, 1);
    assert_eq!(only_b.data[0].kind, MovementKind::In);
}

#[tokio::test]
async fn alerta_de_baixo_estoque_lista_mais_criticos_primeiro() {
    let (state, store) = test_state();
    let product_a = seed_product(store.as_ref(), "CAD-013", 10).await;
    let product_b = seed_product(store.as_ref(), "CAD-014", 10).await;
    let location = seed_location(store.as_ref(), "DEP-01").await;
    let user_id = seed_user(store.as_ref(), "op@loja.com").await;

    state
        .ledger_service
        .record_movement(user_id, product_a.id, location.id, MovementKind::In, 8, None)
        .await
        .unwrap();
    state
        .ledger_service
        .record_movement(user_id, product_b.id, location.id, MovementKind::In, 3, None)
        .await
        .unwrap();

    let alerts = state.ledger_service.low_stock(None).await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].product_id, product_b.id);
    assert_eq!(alerts[1].product_id, product_a.id);
}
