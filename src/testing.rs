//! Shared rubric fixtures for unit tests.

use crate::models::Cell;
use crate::workbook::Sheet;

pub const MARKER: &str = "Spesifikke kommentarer til hvert punkt";

pub fn text_row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|value| Cell::parse(value)).collect()
}

pub fn rubric_sheet(name: &str, rows: Vec<Vec<Cell>>) -> Sheet {
    Sheet {
        name: name.to_string(),
        rows,
    }
}

fn header() -> Vec<Cell> {
    text_row(&[
        "Kategori",
        "Kriterietype",
        "Vurderingskriterium",
        "Lav måloppnåelse",
        "Middels måloppnåelse",
        "Høy måloppnåelse",
        "Vekt",
        "Maks",
        "Merknad",
        "Nordmann, Kari",
        "Hansen, Ola",
        "Berg, Ida",
    ])
}

/// Three criteria in deliberately unsorted order, three students. "Berg, Ida"
/// is missing a score on "Struktur".
pub fn fixture_rows() -> Vec<Vec<Cell>> {
    vec![
        text_row(&["Aktivitet 1: Prosjektrapport"]),
        text_row(&[]),
        header(),
        text_row(&[
            "Rapport", "Innhold", "Analyse", "Svak analyse", "Grei analyse", "God analyse", "1",
            "3", "", "2", "1.5", "3",
        ]),
        text_row(&[
            "Kode", "Kvalitet", "Lesbarhet", "Uleselig", "Delvis lesbar", "Lesbar", "1", "3", "",
            "3", "2.5", "1",
        ]),
        text_row(&[
            "Rapport", "Form", "Struktur", "Rotete", "Ryddig nok", "Svært ryddig", "1", "3", "",
            "1", "2", "",
        ]),
        text_row(&[]),
        text_row(&[MARKER]),
        header(),
        text_row(&[
            "Rapport", "Form", "Struktur", "", "", "", "", "", "",
            "Mangler innholdsfortegnelse", "", "",
        ]),
        text_row(&[
            "Kode", "Kvalitet", "Lesbarhet", "", "", "", "", "", "", "", "Fine navn", "",
        ]),
        text_row(&[
            "Rapport", "Innhold", "Analyse", "", "", "", "", "", "", "", "", "",
        ]),
    ]
}
