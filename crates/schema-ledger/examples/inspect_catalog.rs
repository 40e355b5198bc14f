//! Simple inspector for schema-ledger catalog files.

use schema_ledger::{CatalogFile, check_relation_cycles};

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "schema-ledger.json".to_string());

    println!("Reading: {}", path);

    let file = CatalogFile::load_or_create(&path).expect("failed to open catalog");
    let catalog = file.catalog();

    println!("\n=== Catalog ===");
    println!("Entities: {}", catalog.entities.len());
    println!("Last entity id: {}", catalog.last_entity_id);
    if !catalog.last_index_id.is_empty() {
        println!("Last index id: {}", catalog.last_index_id);
    }
    if !catalog.last_relation_id.is_empty() {
        println!("Last relation id: {}", catalog.last_relation_id);
    }
    println!(
        "Retired uids: {} entity, {} index, {} property, {} relation",
        catalog.retired_entity_uids.len(),
        catalog.retired_index_uids.len(),
        catalog.retired_property_uids.len(),
        catalog.retired_relation_uids.len()
    );

    for entity in &catalog.entities {
        println!("\n[{}] {}", entity.id, entity.name);
        for property in &entity.properties {
            let mut line = format!("    [{}] {}", property.id, property.name);
            if let Some(index_id) = &property.index_id {
                line.push_str(&format!(" (indexed {})", index_id));
            }
            if let Some(target) = &property.relation_target {
                line.push_str(&format!(" -> {}", target));
            }
            println!("{}", line);
        }
        for relation in &entity.relations {
            println!("    [{}] {} (to-many)", relation.id, relation.name);
        }
    }

    println!("\n=== Checks ===");
    match catalog.validate() {
        Ok(()) => println!("structure: ok"),
        Err(err) => println!("structure: {}", err),
    }
    match check_relation_cycles(catalog) {
        Ok(()) => println!("relation cycles: none"),
        Err(err) => println!("relation cycles: {}", err),
    }
}
