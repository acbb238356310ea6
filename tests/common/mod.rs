use rand::Rng;
use std::io::{Error, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const FIXTURE: &str = "tests/fixtures/fixture.json";
pub const HEADER: &str = "command, user, item, proposal, percentage_based, payments, message";

/// Writes a command file with the standard header followed by `rows`.
pub fn commands(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

/// Writes a fixture with two parties sharing `items` items, and a command
/// file where party A proposes a random percentage split for every item and
/// party B accepts it.
pub fn generate_scenario(fixture: &Path, commands: &Path, items: usize) -> Result<(), Error> {
    let items_json: Vec<serde_json::Value> = (1..=items)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": format!("Item {id}"),
                "created_at": "2025-01-08T16:10:16Z",
                "price": format!("{}.{:02}", id * 10, id % 100),
                "parties": [1, 2]
            })
        })
        .collect();
    let fixture_json = serde_json::json!({
        "parties": [{ "id": 1, "name": "Party A" }, { "id": 2, "name": "Party B" }],
        "users": [
            { "id": 1, "name": "John Doe", "party": 1 },
            { "id": 2, "name": "Jane Smith", "party": 2 }
        ],
        "items": items_json
    });
    std::fs::write(fixture, serde_json::to_vec_pretty(&fixture_json)?)?;

    let mut rng = rand::thread_rng();
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(commands)?;
    wtr.write_record(HEADER.split(", "))?;
    for id in 1..=items {
        let share: u32 = rng.gen_range(0..=100);
        let payments = format!("1={share};2={}", 100 - share);
        wtr.write_record([
            "propose",
            "1",
            &id.to_string(),
            "",
            "true",
            &payments,
            "generated",
        ])?;
        // Proposal ids follow item ids because every proposal succeeds.
        wtr.write_record(["accept", "2", "", &id.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
