use common::{LineItem, OrderId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{NewOrder, OrderStatus, Stock};

fn bench_stock_reserve(c: &mut Criterion) {
    c.bench_function("domain/stock_reserve", |b| {
        b.iter(|| {
            let mut stock = Stock::new(ProductId::new(1), 1_000).unwrap();
            for _ in 0..100 {
                stock.reserve(7).unwrap();
            }
            stock
        });
    });
}

fn bench_stock_reserve_rejected(c: &mut Criterion) {
    let stock = Stock::new(ProductId::new(1), 1).unwrap();

    c.bench_function("domain/stock_reserve_rejected", |b| {
        b.iter(|| stock.can_reserve(2).is_err());
    });
}

fn bench_order_lifecycle(c: &mut Criterion) {
    let items: Vec<LineItem> = (1..=10).map(|p| LineItem::new(p, 2, 9.99)).collect();

    c.bench_function("domain/order_pending_to_confirmed", |b| {
        b.iter(|| {
            let mut order = NewOrder::pending(UserId::new(42), items.clone())
                .unwrap()
                .into_order(OrderId::new(1));
            order.transition_to(OrderStatus::Confirmed).unwrap();
            assert_eq!(order.status, OrderStatus::Confirmed);
            order.total()
        });
    });
}

criterion_group!(
    benches,
    bench_stock_reserve,
    bench_stock_reserve_rejected,
    bench_order_lifecycle
);
criterion_main!(benches);
