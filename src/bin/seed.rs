//! Seeds the database with a demo catalog and demo accounts, going
//! through the same services the API uses.

use eshop_api as api;

use api::entities::{product, user, Product, User};
use api::services::accounts::RegisterInput;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    category: &'static str,
    stock_quantity: i32,
    image_url: &'static str,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Laptop Pro 15",
        description: "High-performance laptop with 16GB RAM, 512GB SSD, and Intel Core i7 processor",
        price: "1299.99",
        category: "Electronics",
        stock_quantity: 25,
        image_url: "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Wireless Mouse",
        description: "Ergonomic wireless mouse with precision tracking and long battery life",
        price: "29.99",
        category: "Electronics",
        stock_quantity: 100,
        image_url: "https://images.unsplash.com/photo-1527864550417-7fd91fc51a46?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Mechanical Keyboard",
        description: "RGB mechanical keyboard with blue switches and customizable lighting",
        price: "89.99",
        category: "Electronics",
        stock_quantity: 50,
        image_url: "https://images.unsplash.com/photo-1587829741301-dc798b83add3?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "USB-C Hub",
        description: "7-in-1 USB-C hub with HDMI, USB 3.0, SD card reader, and power delivery",
        price: "49.99",
        category: "Electronics",
        stock_quantity: 75,
        image_url: "https://images.unsplash.com/photo-1625948515291-69613efd103f?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Noise Cancelling Headphones",
        description: "Premium wireless headphones with active noise cancellation and 30-hour battery",
        price: "249.99",
        category: "Audio",
        stock_quantity: 40,
        image_url: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Portable SSD 1TB",
        description: "Fast external SSD with USB 3.2 Gen 2 for quick file transfers",
        price: "129.99",
        category: "Storage",
        stock_quantity: 60,
        image_url: "https://images.unsplash.com/photo-1531492746076-161ca9bcad58?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Webcam HD 1080p",
        description: "Full HD webcam with auto-focus and built-in microphone",
        price: "79.99",
        category: "Electronics",
        stock_quantity: 45,
        image_url: "https://images.unsplash.com/photo-1587825140708-dfaf72ae4b04?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Monitor 27\" 4K",
        description: "27-inch 4K UHD monitor with IPS panel and HDR support",
        price: "399.99",
        category: "Electronics",
        stock_quantity: 20,
        image_url: "https://images.unsplash.com/photo-1527443224154-c4a3942d3acf?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Desk Lamp LED",
        description: "Adjustable LED desk lamp with touch controls and USB charging port",
        price: "39.99",
        category: "Office",
        stock_quantity: 80,
        image_url: "https://images.unsplash.com/photo-1507473885765-e6ed057f782c?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Laptop Stand Aluminum",
        description: "Ergonomic aluminum laptop stand with adjustable height and angle",
        price: "44.99",
        category: "Office",
        stock_quantity: 55,
        image_url: "https://images.unsplash.com/photo-1625225233840-695456021cde?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Wireless Charger",
        description: "Fast wireless charging pad compatible with Qi-enabled devices and wearables",
        price: "24.99",
        category: "Accessories",
        stock_quantity: 90,
        image_url: "https://images.unsplash.com/photo-1609712509268-f70f2a196f6c?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Bluetooth Speaker",
        description: "Portable Bluetooth speaker with 360-degree sound and waterproof design",
        price: "69.99",
        category: "Audio",
        stock_quantity: 65,
        image_url: "https://images.unsplash.com/photo-1608043152269-423dbba4e7e1?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Smart Watch",
        description: "Fitness tracker smart watch with heart rate monitor and GPS",
        price: "199.99",
        category: "Wearables",
        stock_quantity: 35,
        image_url: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Phone Case Premium",
        description: "Protective phone case with shock absorption and slim design",
        price: "19.99",
        category: "Accessories",
        stock_quantity: 150,
        image_url: "https://images.unsplash.com/photo-1601784551446-20c9e07cdbdb?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Cable Organizer Set",
        description: "Set of cable organizers and clips for desk cable management",
        price: "14.99",
        category: "Office",
        stock_quantity: 120,
        image_url: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=300&h=300&fit=crop",
    },
    SeedProduct {
        name: "Gaming Mouse Pad",
        description: "Large gaming mouse pad with smooth surface and anti-slip base",
        price: "19.99",
        category: "Gaming",
        stock_quantity: 85,
        image_url: "https://images.unsplash.com/photo-1616588589676-62b3bd4ff6d2?w=300&h=300&fit=crop",
    },
];

struct SeedUser {
    username: &'static str,
    email: &'static str,
    full_name: &'static str,
    password: &'static str,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        username: "admin",
        email: "admin@eshop.com",
        full_name: "Administrator",
        password: "admin123",
    },
    SeedUser {
        username: "john_doe",
        email: "john@example.com",
        full_name: "John Doe",
        password: "password123",
    },
    SeedUser {
        username: "jane_smith",
        email: "jane@example.com",
        full_name: "Jane Smith",
        password: "password123",
    },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db = Arc::new(api::db::establish_connection_from_app_config(&cfg).await?);
    api::db::run_migrations(&db).await?;

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let services = api::services::AppServices::new(db.clone(), Arc::new(event_sender), &cfg);

    for seed in SEED_USERS {
        let exists = User::find()
            .filter(user::Column::Username.eq(seed.username))
            .one(&*db)
            .await?
            .is_some();
        if exists {
            info!("User {} already exists", seed.username);
            continue;
        }

        services
            .accounts
            .register(RegisterInput {
                username: seed.username.to_string(),
                email: seed.email.to_string(),
                password: seed.password.to_string(),
                full_name: Some(seed.full_name.to_string()),
                phone: None,
                address: None,
            })
            .await?;
        info!("Created user: {}", seed.username);
    }

    for seed in SEED_PRODUCTS {
        let exists = Product::find()
            .filter(product::Column::Name.eq(seed.name))
            .one(&*db)
            .await?
            .is_some();
        if exists {
            info!("Product {} already exists", seed.name);
            continue;
        }

        services
            .catalog
            .create_product(api::services::catalog::CreateProductInput {
                name: seed.name.to_string(),
                price: Decimal::from_str(seed.price)?,
                description: Some(seed.description.to_string()),
                category: Some(seed.category.to_string()),
                image_url: Some(seed.image_url.to_string()),
                stock_quantity: Some(seed.stock_quantity),
            })
            .await?;
        info!("Created product: {}", seed.name);
    }

    info!("Seeding complete");
    Ok(())
}
