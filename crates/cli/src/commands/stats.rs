//! `lpg stats` - the dashboard figures.

use super::{CliError, Context};

pub async fn show(ctx: &Context) -> Result<(), CliError> {
    let stats = ctx.client.dashboard_stats().await?;

    println!("Total products:  {}", stats.total_products);
    println!("Low stock items: {}", stats.low_stock);
    match stats.total_users {
        Some(n) => println!("Total users:     {n}"),
        None => println!("Total users:     (admin only)"),
    }
    Ok(())
}
