//! Built-in sheet templates.

use crate::model::{Column, ColumnType, Sheet, SheetColor};

pub const BLANK_SHEET_NAME: &str = "Yeni Sayfa";

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub options: &'static [&'static str],
}

impl ColumnDef {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            options: &[],
        }
    }

    const fn select(name: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            name,
            column_type: ColumnType::Select,
            options,
        }
    }

    fn to_column(self) -> Column {
        let options = (!self.options.is_empty())
            .then(|| self.options.iter().map(|o| o.to_string()).collect());
        Column::new(self.name, self.column_type, options)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    /// Short key used on the command line.
    pub key: &'static str,
    pub name: &'static str,
    pub color: SheetColor,
    pub columns: &'static [ColumnDef],
}

impl Preset {
    pub fn instantiate(&self) -> Option<Sheet> {
        Sheet::new(
            self.name,
            self.color,
            self.columns.iter().map(|def| def.to_column()).collect(),
        )
    }
}

const BLANK_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("Baslik", ColumnType::Text),
    ColumnDef::new("Deger", ColumnType::Number),
    ColumnDef::new("Not", ColumnType::Text),
];

pub const PRESETS: &[Preset] = &[
    Preset {
        key: "butce",
        name: "Butce Takibi",
        color: SheetColor::Green,
        columns: &[
            ColumnDef::new("Kalem", ColumnType::Text),
            ColumnDef::select("Tur", &["Gelir", "Gider"]),
            ColumnDef::new("Tutar", ColumnType::Number),
            ColumnDef::new("Tarih", ColumnType::Date),
            ColumnDef::new("Aciklama", ColumnType::Text),
        ],
    },
    Preset {
        key: "gorev",
        name: "Gorev Listesi",
        color: SheetColor::Violet,
        columns: &[
            ColumnDef::new("Gorev", ColumnType::Text),
            ColumnDef::new("Sorumlu", ColumnType::Text),
            ColumnDef::select("Durum", &["Bekliyor", "Devam Ediyor", "Tamamlandi"]),
            ColumnDef::select("Oncelik", &["Dusuk", "Orta", "Yuksek"]),
            ColumnDef::new("Son Tarih", ColumnType::Date),
        ],
    },
    Preset {
        key: "fatura",
        name: "Fatura Takibi",
        color: SheetColor::Blue,
        columns: &[
            ColumnDef::new("Fatura No", ColumnType::Text),
            ColumnDef::new("Firma", ColumnType::Text),
            ColumnDef::new("Tutar", ColumnType::Number),
            ColumnDef::new("Vade", ColumnType::Date),
            ColumnDef::select("Durum", &["Odendi", "Odenmedi", "Gecikti"]),
        ],
    },
    Preset {
        key: "stok",
        name: "Stok Takibi",
        color: SheetColor::Orange,
        columns: &[
            ColumnDef::new("Urun", ColumnType::Text),
            ColumnDef::new("Adet", ColumnType::Number),
            ColumnDef::new("Birim Fiyat", ColumnType::Number),
            ColumnDef::select("Depo", &["Merkez", "Sube"]),
        ],
    },
    Preset {
        key: "iletisim",
        name: "Iletisim Listesi",
        color: SheetColor::Teal,
        columns: &[
            ColumnDef::new("Ad Soyad", ColumnType::Text),
            ColumnDef::new("Firma", ColumnType::Text),
            ColumnDef::new("Telefon", ColumnType::Text),
            ColumnDef::new("E-posta", ColumnType::Text),
            ColumnDef::new("Not", ColumnType::Text),
        ],
    },
];

/// "Yeni Sayfa" with a text title column, a number value column, and a note
/// column.
pub fn blank_sheet() -> Option<Sheet> {
    Sheet::new(
        BLANK_SHEET_NAME,
        SheetColor::Gray,
        BLANK_COLUMNS.iter().map(|def| def.to_column()).collect(),
    )
}

/// Finds a preset by key or by case-insensitive name.
pub fn find_preset(key: &str) -> Option<&'static Preset> {
    let lowered = key.trim().to_lowercase();
    PRESETS
        .iter()
        .find(|preset| preset.key == lowered || preset.name.to_lowercase() == lowered)
}
