//! Inventory commands.

use lpg_core::{NewProduct, Product, ProductId, ProductPatch};

use super::{CliError, Context, peso};

/// `lpg products list [--search <text>] [--low-stock]`
pub async fn list(ctx: &Context, search: Option<&str>, low_stock: bool) -> Result<(), CliError> {
    let list = ctx.client.product_list().await?;
    if let Some(fetched_at) = list.cached_at {
        println!(
            "API unreachable; showing products cached at {}",
            fetched_at.format("%Y-%m-%d %H:%M")
        );
    }

    let mut products: Vec<Product> = list
        .products
        .into_iter()
        .filter(|p| search.is_none_or(|needle| p.matches(needle)))
        .filter(|p| !low_stock || p.is_low_stock())
        .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    if products.is_empty() {
        println!("No products found");
        return Ok(());
    }

    println!(
        "{:<24} {:<28} {:<14} {:>6} {:>12}",
        "ID", "NAME", "CATEGORY", "QTY", "PRICE"
    );
    for p in &products {
        let flag = if p.is_low_stock() { " LOW" } else { "" };
        println!(
            "{:<24} {:<28} {:<14} {:>6} {:>12}{flag}",
            p.id,
            p.name,
            p.category,
            p.quantity,
            peso(p.price)
        );
    }
    println!("{} product(s)", products.len());
    Ok(())
}

/// `lpg products add ...`
pub async fn add(ctx: &Context, draft: &NewProduct) -> Result<(), CliError> {
    ctx.require_session().await?;
    let product = ctx.client.add_product(draft).await?;
    println!("Added {} (id {})", product.name, product.id);
    Ok(())
}

/// `lpg products update <id> ...`
pub async fn update(ctx: &Context, id: String, patch: &ProductPatch) -> Result<(), CliError> {
    ctx.require_session().await?;
    if patch.is_empty() {
        tracing::warn!("No fields given; only the update timestamp will change");
    }
    let product = ctx.client.update_product(&ProductId::new(id), patch).await?;
    println!(
        "Updated {}: qty {}, {}",
        product.name,
        product.quantity,
        peso(product.price)
    );
    Ok(())
}

/// `lpg products delete <id>`
pub async fn delete(ctx: &Context, id: String) -> Result<(), CliError> {
    ctx.require_session().await?;
    let id = ProductId::new(id);
    ctx.client.delete_product(&id).await?;
    println!("Deleted product {id}");
    Ok(())
}
