//! Header alias resolution.

use csv::StringRecord;

pub const ID: &[&str] = &["ID", "id", "№", "ID абитуриента", "Номер", "Код", "Абитуриент"];
pub const CONSENT: &[&str] = &["Согласие", "consent", "Consent", "Согласие на зачисление", "Подписано"];
pub const PRIORITY: &[&str] = &["Приоритет", "priority", "Priority", "Номер приоритета"];
pub const PHYSICS_ICT: &[&str] = &["Физика/ИКТ", "Physics/ICT", "phys_ict"];
pub const RUSSIAN: &[&str] = &["Русский язык", "Russian", "russian"];
pub const MATH: &[&str] = &["Математика", "Math", "math"];
pub const ACHIEVEMENTS: &[&str] = &["Достижения", "Индивидуальные достижения", "Achievements"];

/// Column indices for every field, in alias order.
#[derive(Debug, Default)]
pub struct Columns {
  pub id:           Vec<usize>,
  pub consent:      Vec<usize>,
  pub priority:     Vec<usize>,
  pub physics_ict:  Vec<usize>,
  pub russian:      Vec<usize>,
  pub math:         Vec<usize>,
  pub achievements: Vec<usize>,
}

impl Columns {
  pub fn resolve(headers: &StringRecord) -> Self {
    let names: Vec<&str> = headers
      .iter()
      .map(|h| h.trim_start_matches('\u{feff}').trim())
      .collect();
    let find = |aliases: &[&str]| -> Vec<usize> {
      aliases
        .iter()
        .filter_map(|alias| names.iter().position(|name| name == alias))
        .collect()
    };

    Self {
      id:           find(ID),
      consent:      find(CONSENT),
      priority:     find(PRIORITY),
      physics_ict:  find(PHYSICS_ICT),
      russian:      find(RUSSIAN),
      math:         find(MATH),
      achievements: find(ACHIEVEMENTS),
    }
  }
}

/// The values of `columns` in `record` that are not blank, in alias order.
pub fn non_empty<'r>(
  record: &'r StringRecord,
  columns: &'r [usize],
) -> impl Iterator<Item = &'r str> + 'r {
  columns
    .iter()
    .filter_map(|&i| record.get(i))
    .map(str::trim)
    .filter(|v| !v.is_empty())
}
