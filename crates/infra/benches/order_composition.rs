use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use rust_decimal::Decimal;
use salesdesk_core::TenantId;
use salesdesk_infra::{
    ComposeOrderRequest, InMemoryCommercialStore, OrderCompositionService, OrderLineRequest,
};
use salesdesk_parties::{ClientId, ClientRecord};
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_sales::{OrderHeader, RequestedLine, compose};
use std::sync::Arc;

fn requested_lines(count: usize) -> Vec<RequestedLine> {
    (0..count)
        .map(|i| RequestedLine {
            product_id: ProductId::new(),
            quantity: Decimal::new((i as i64 % 7) + 1, 0),
            unit_price: Decimal::new(1_000 + i as i64 * 13, 2),
            discount: Some(Decimal::new(i as i64 % 50, 2)),
        })
        .collect()
}

/// Pure line pricing and totals, no store.
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    for count in [1usize, 10, 100] {
        let lines = requested_lines(count);
        let header = OrderHeader {
            client_id: Some(ClientId::new()),
            ..OrderHeader::default()
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &lines, |b, lines| {
            b.iter(|| {
                compose(
                    black_box(TenantId::new()),
                    header.clone(),
                    black_box(lines),
                    Utc::now(),
                )
            })
        });
    }
    group.finish();
}

/// Full service path against the in-memory store, including numbering.
fn bench_compose_order(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let tenant_id = TenantId::new();
    let store = Arc::new(InMemoryCommercialStore::new());

    let client = ClientRecord {
        id: ClientId::new(),
        tenant_id,
        name: "Bench client".to_string(),
        price_group_id: None,
        commercial_area_id: None,
    };
    store.put_client(client.clone()).unwrap();

    let products: Vec<ProductRecord> = (0..20)
        .map(|i| ProductRecord {
            id: ProductId::new(),
            tenant_id,
            name: format!("Product {i}"),
            list_price: Decimal::new(500 + i * 25, 2),
            active: true,
        })
        .collect();
    for p in &products {
        store.put_product(p.clone()).unwrap();
    }

    let service = OrderCompositionService::new(store);
    let request = ComposeOrderRequest {
        client_id: client.id,
        salesperson_id: None,
        status: None,
        valid_until: None,
        payment_condition_id: None,
        notes: None,
        price_table_id: None,
        lines: products
            .iter()
            .map(|p| OrderLineRequest {
                product_id: p.id,
                quantity: Decimal::new(2, 0),
                unit_price: None,
                discount: None,
            })
            .collect(),
    };

    c.bench_function("compose_order_in_memory_20_lines", |b| {
        b.iter(|| {
            runtime
                .block_on(service.compose_order(tenant_id, black_box(request.clone())))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_compose, bench_compose_order);
criterion_main!(benches);
