//! Gzip-compressed CSV artifact encoding

use flate2::{write::GzEncoder, Compression};
use thiserror::Error;

use super::source::Monster;

/// Header row of the monsters artifact.
pub const MONSTER_CSV_HEADER: [&str; 8] = [
    "id",
    "name",
    "category",
    "description",
    "image",
    "common_locations",
    "drops",
    "dlc",
];

/// Separator for list-valued columns.
pub const LIST_SEPARATOR: &str = ", ";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to finish gzip stream: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded artifact ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedReport {
    pub bytes: Vec<u8>,
    /// Data rows, header excluded
    pub rows: usize,
}

fn monster_record(monster: &Monster) -> [String; 8] {
    [
        monster.id.to_string(),
        monster.name.clone(),
        monster.category.clone(),
        monster.description.clone(),
        monster.image.clone(),
        monster.common_locations.join(LIST_SEPARATOR),
        monster.drops.join(LIST_SEPARATOR),
        monster.dlc.to_string(),
    ]
}

/// Write a header plus one row per monster, gzip the result.
pub fn encode_monsters(monsters: &[Monster]) -> Result<EncodedReport, EncodeError> {
    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(gz);

    writer.write_record(MONSTER_CSV_HEADER)?;
    for monster in monsters {
        writer.write_record(monster_record(monster))?;
    }

    let gz = writer.into_inner().map_err(|e| e.into_error())?;
    let bytes = gz.finish()?;

    Ok(EncodedReport {
        bytes,
        rows: monsters.len(),
    })
}
