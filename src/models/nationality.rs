use std::collections::HashMap;
use lazy_static::lazy_static;

/// Read-only mapping from the 3-digit nationality segment of a QID to a
/// nationality name. Built once on first use and shared by reference.
#[derive(Debug)]
pub struct NationalityTable {
    codes: HashMap<&'static str, &'static str>,
}

lazy_static! {
    static ref NATIONALITIES: NationalityTable = NationalityTable::new();
}

impl NationalityTable {
    fn new() -> Self {
        let entries: [(&'static str, &'static str); 24] = [
            ("250", "French"),
            ("276", "German"),
            ("826", "British"),
            ("840", "American"),
            ("356", "Indian"),
            ("586", "Pakistani"),
            ("050", "Bangladeshi"),
            ("144", "Sri Lankan"),
            ("524", "Nepalese"),
            ("608", "Filipino"),
            ("634", "Qatari"),
            ("682", "Saudi Arabian"),
            ("784", "Emirati"),
            ("414", "Kuwaiti"),
            ("048", "Bahraini"),
            ("512", "Omani"),
            ("400", "Jordanian"),
            ("422", "Lebanese"),
            ("760", "Syrian"),
            ("818", "Egyptian"),
            ("012", "Algerian"),
            ("504", "Moroccan"),
            ("788", "Tunisian"),
            ("434", "Libyan"),
        ];

        NationalityTable {
            codes: entries.into_iter().collect(),
        }
    }

    /// The process-wide table.
    pub fn global() -> &'static NationalityTable {
        &NATIONALITIES
    }

    pub fn get(&self, code: &str) -> Option<&'static str> {
        self.codes.get(code).copied()
    }

    /// Nationality name for `code`, or `Unknown (<code>)` when the code is not listed.
    pub fn name_or_unknown(&self, code: &str) -> String {
        match self.get(code) {
            Some(name) => name.to_string(),
            None => format!("Unknown ({})", code),
        }
    }

}
