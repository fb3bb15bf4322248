//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `craftnook_core` linkage.
//! - With a database path argument, print the stats-screen summary.

use craftnook_core::service::projection::inventory_summary;
use craftnook_core::{
    open_db, CategoryRepository, MaterialRepository, SqliteCategoryRepository,
    SqliteMaterialRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("craftnook_core ping={}", craftnook_core::ping());
    println!("craftnook_core version={}", craftnook_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match print_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("craftnook_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &str) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| format!("cannot open `{db_path}`: {err}"))?;
    let materials = SqliteMaterialRepository::new(&conn)
        .list_materials()
        .map_err(|err| err.to_string())?;
    let categories = SqliteCategoryRepository::new(&conn)
        .list_categories()
        .map_err(|err| err.to_string())?;

    let summary = inventory_summary(&materials, &categories);
    println!("total_items={}", summary.total_items);
    println!("total_units={}", summary.total_units);
    println!("categories_used={}", summary.categories_used);
    for stat in &summary.stats {
        println!(
            "category={} units={} percentage={:.1}",
            stat.category, stat.units, stat.percentage
        );
    }
    Ok(())
}
