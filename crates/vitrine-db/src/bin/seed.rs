//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for local development, so the
//! search API can be exercised without an upstream inventory.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p vitrine-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vitrine-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p vitrine-db --bin seed -- --db ./data/vitrine.db
//! ```
//!
//! ## Generated Products
//! Home-goods catalog across groups:
//! - Cama, Mesa e Banho
//! - Cozinha
//! - Ferramentas
//! - Limpeza
//!
//! Each product has:
//! - Code: `{group}{index:04}`
//! - Name: `{item} {variation}`
//! - Regular price and a 5% lower cash price

use std::env;
use vitrine_core::{Money, Product, ProductGroup};
use vitrine_db::{Database, DbConfig};

/// Groups with their items.
const GROUPS: &[(&str, &str, &[&str])] = &[
    (
        "1",
        "Cama, Mesa e Banho",
        &[
            "Toalha de Banho",
            "Toalha de Rosto",
            "Lençol Casal",
            "Lençol Solteiro",
            "Fronha",
            "Edredom",
            "Cobertor",
            "Travesseiro",
            "Toalha de Mesa",
            "Jogo Americano",
            "Enxoval de Bebê",
            "Roupão",
        ],
    ),
    (
        "2",
        "Cozinha",
        &[
            "Panela de Pressão",
            "Frigideira Antiaderente",
            "Jogo de Facas",
            "Tábua de Corte",
            "Escorredor de Pratos",
            "Garrafa Térmica",
            "Assadeira",
            "Conjunto de Potes",
            "Pano de Prato",
            "Avental",
        ],
    ),
    (
        "3",
        "Ferramentas",
        &[
            "Martelo",
            "Chave de Fenda",
            "Alicate Universal",
            "Trena",
            "Furadeira",
            "Jogo de Chaves",
            "Serrote",
            "Nível",
        ],
    ),
    (
        "4",
        "Limpeza",
        &[
            "Água Sanitária",
            "Detergente",
            "Desinfetante",
            "Vassoura",
            "Rodo",
            "Balde",
            "Esponja",
            "Papel Toalha",
        ],
    ),
];

/// Variations with a price addition in cents.
const VARIATIONS: &[(&str, i64)] = &[
    ("Branco", 0),
    ("Azul", 0),
    ("Cinza", 150),
    ("Estampado", 400),
    ("Premium", 1500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./vitrine_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vitrine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./vitrine_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vitrine Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let groups: Vec<ProductGroup> = GROUPS
        .iter()
        .map(|(code, description, _)| ProductGroup::new(*code, *description))
        .collect();
    db.groups().upsert_batch(&groups).await?;
    println!("✓ {} groups", groups.len());

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let products = generate_products(count);
    for batch in products.chunks(100) {
        db.products().upsert_batch(batch).await?;
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", products.len(), elapsed);

    println!();
    println!("Verifying FTS index...");
    let hits = db.products().relevance(&["toalha", "toalhas"]).await?;
    println!("  'toalha': {} matches", hits.len());
    let hits = db.products().relevance(&["lencol", "lencois"]).await?;
    println!("  'lencol': {} matches", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Walks groups × items × variations until `count` products exist.
fn generate_products(count: usize) -> Vec<Product> {
    let mut products = Vec::with_capacity(count);

    for (group_code, group_description, items) in GROUPS {
        for (item_idx, item) in items.iter().enumerate() {
            for (variation_idx, (variation, addon)) in VARIATIONS.iter().enumerate() {
                if products.len() >= count {
                    return products;
                }

                let index = item_idx * VARIATIONS.len() + variation_idx;
                let regular = 990 + (item_idx as i64 * 730) % 15_000 + addon;
                let cash = regular * 95 / 100;

                products.push(
                    Product::new(format!("{group_code}{index:04}"), format!("{item} {variation}"))
                        .with_prices(Money::from_cents(regular), Money::from_cents(cash))
                        .with_group(*group_code, *group_description),
                );
            }
        }
    }

    products
}
