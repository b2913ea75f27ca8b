//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use dynaquery::memory::MemoryEngine;
use dynaquery::{Collection, Container, ReadOptions, RelaxedExecutor, Shape};
use fake::faker::lorem::en::Word;
use fake::{Dummy, Fake, Faker};

#[derive(Shape, Dummy, Clone, Debug, PartialEq)]
pub struct Product {
    pub id: u64,
    #[dummy(faker = "Word()")]
    pub name: String,
    #[dummy(faker = "1..500")]
    pub price: i64,
    #[dummy(faker = "0..3")]
    pub status: i32,
}

#[derive(Shape, Clone, Debug, PartialEq)]
pub struct Item {
    #[shape(key)]
    pub code: String,
    pub name: String,
}

#[derive(Shape, Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: u64,
    pub guest: String,
    pub date_from: i64,
    pub date_to: i64,
    pub status: i32,
    pub total: f64,
}

pub struct Shop;

impl Container for Shop {
    fn collections(&self) -> Vec<Collection> {
        vec![
            Collection::of::<Item>("BaseItems"),
            Collection::of::<Product>("Products"),
            Collection::of::<Booking>("Orders"),
            Collection::of::<Booking>("OrderLines"),
        ]
    }
}

/// `count` products with ids `1..=count` and fake names and prices.
pub fn products(count: u64) -> Vec<Product> {
    (1..=count)
        .map(|id| {
            let mut product: Product = Faker.fake();
            product.id = id;
            product
        })
        .collect()
}

pub fn bookings() -> Vec<Booking> {
    let booking = |id, guest: &str, date_from, date_to, status, total| Booking {
        id,
        guest: guest.to_string(),
        date_from,
        date_to,
        status,
        total,
    };
    vec![
        booking(1, "Ada Lovelace", 10, 12, 1, 80.0),
        booking(2, "Alan Turing", 11, 15, 2, 120.0),
        booking(3, "Grace Hopper", 14, 16, 1, 100.0),
        booking(4, "Adele Goldberg", 20, 21, 3, 45.5),
    ]
}

pub fn engine() -> MemoryEngine {
    MemoryEngine::new()
        .with_rows("Products", &products(30))
        .with_rows("Orders", &bookings())
}

pub fn executor(engine: MemoryEngine) -> RelaxedExecutor<MemoryEngine> {
    RelaxedExecutor::new(engine, ReadOptions::default())
}
