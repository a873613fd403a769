//! Zero-sum properties of generated transactions

use proptest::prelude::*;
use rust_decimal::Decimal;
use tab_core::{Member, Money, Product, Transaction, TxnDate};
use tab_ledger::compute_residual;

const MEMBERS: [&str; 3] = [
    "Liabilities:Bar:Members:Alice",
    "Liabilities:Bar:Members:Bob",
    "Liabilities:Bar:Members:Carol",
];

fn cents(value: i64) -> Money {
    Money::from_decimal(Decimal::new(value, 2))
}

fn when() -> Option<TxnDate> {
    Some(chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().into())
}

prop_compose! {
    fn product(index: usize)(
        price in 0i64..10_000,
        payback in proptest::option::of((0usize..MEMBERS.len(), 0i64..500)),
    ) -> Product {
        let product = Product::new(format!("P{index}"), format!("P{index}"), cents(price));
        match payback {
            Some((payee, amount)) => product.with_payback(MEMBERS[payee], cents(amount)),
            None => product,
        }
    }
}

fn basket() -> impl Strategy<Value = Vec<(Product, u32)>> {
    (0usize..6).prop_flat_map(|len| {
        (0..len)
            .map(|i| (product(i), 0u32..20))
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn purchases_sum_to_zero(items in basket(), buyer in 0usize..MEMBERS.len()) {
        let buyer = Member::new(MEMBERS[buyer]).unwrap();
        let txn = Transaction::purchase(&buyer, &items, "EUR", when()).unwrap();

        prop_assert!(txn.is_balanced());
        prop_assert!(compute_residual(txn.postings()).is_empty());
    }

    #[test]
    fn buyer_is_charged_the_basket_price(items in basket()) {
        let buyer = Member::new(MEMBERS[0]).unwrap();
        let txn = Transaction::purchase(&buyer, &items, "EUR", when()).unwrap();

        let expected: Money = items.iter().map(|(p, qty)| p.price * *qty).sum();
        let charged: Decimal = txn
            .postings()
            .iter()
            .filter(|p| p.account == buyer.account)
            .filter_map(|p| p.units.as_ref())
            .filter(|u| u.currency == "EUR")
            .map(|u| u.number)
            .sum();
        prop_assert_eq!(charged, expected.amount());
    }

    #[test]
    fn transfers_and_deposits_sum_to_zero(amount in -100_000i64..100_000) {
        let alice = Member::new(MEMBERS[0]).unwrap();
        let bob = Member::new(MEMBERS[1]).unwrap();

        let transfer = Transaction::transfer(&alice, &bob, cents(amount), "EUR", when()).unwrap();
        let deposit = Transaction::deposit(&alice, cents(amount), "EUR", when()).unwrap();

        prop_assert!(transfer.is_balanced());
        prop_assert!(deposit.is_balanced());
    }
}
