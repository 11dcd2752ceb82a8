#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  /// Document id.  Set on insert only.
  Primary,
  /// Set on insert only (owner, creation date).
  Fixed,
  /// Only written by dedicated statements.
  Extra,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

impl Default for ColumnMapper {
  fn default() -> Self {
    Self {
      name: "".to_string(),
      column: "".to_string(),
      note: ColumnNote::None,
    }
  }
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

pub fn noted(name: &'static str, note: ColumnNote) -> ColumnMapper {
  ColumnMapper {
    note,
    ..column(name)
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  fn selected(&self, all_columns: bool) -> impl Iterator<Item = &ColumnMapper> {
    self.columns.iter().filter(move |col| all_columns || col.note != ColumnNote::Extra)
  }

  pub fn get_columns(&self, all_columns: bool) -> String {
    self.selected(all_columns)
      .map(|col| col.column.clone())
      .collect::<Vec<String>>().join(", ")
  }

  /// Column list qualified with a table alias, e.g. `p.id, p.user_id`.
  pub fn get_columns_prefixed(&self, prefix: &str, all_columns: bool) -> String {
    self.selected(all_columns)
      .map(|col| format!("{}.{}", prefix, col.column))
      .collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self, all_columns: bool) -> String {
    format!("SELECT {} FROM {}", self.get_columns(all_columns), self.table_name)
  }

  pub fn build_insert_query(&self, all_columns: bool) -> String {
    let columns = self.get_columns(all_columns);
    let values = (1..=self.selected(all_columns).count())
      .map(|idx| format!("${}", idx))
      .collect::<Vec<String>>().join(", ");
    format!("INSERT INTO {}({}) VALUES({})", self.table_name, columns, values)
  }

  /// Insert, or update every non-`Primary`/`Fixed` column on conflict.
  pub fn build_upsert(&self, on_conflict: &str, all_columns: bool) -> String {
    let updates = self.selected(all_columns)
      .filter(|col| col.note != ColumnNote::Primary && col.note != ColumnNote::Fixed)
      .map(|col| format!("{} = EXCLUDED.{}", col.column, col.column))
      .collect::<Vec<String>>().join(", ");
    format!("{}\n  ON CONFLICT {}\n  DO UPDATE SET {}",
      self.build_insert_query(all_columns), on_conflict, updates)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mappers() -> ColumnMappers {
    ColumnMappers {
      table_name: "profiles",
      columns: vec![
        noted("id", ColumnNote::Primary),
        noted("user_id", ColumnNote::Fixed),
        column("status"),
        column("skills"),
        noted("experience", ColumnNote::Extra),
      ],
    }
  }

  #[test]
  fn select_skips_extra_columns() {
    let m = mappers();
    assert_eq!(m.build_select_query(false), "SELECT id, user_id, status, skills FROM profiles");
    assert_eq!(m.get_columns_prefixed("p", true), "p.id, p.user_id, p.status, p.skills, p.experience");
  }

  #[test]
  fn insert_numbers_params() {
    assert_eq!(mappers().build_insert_query(false),
      "INSERT INTO profiles(id, user_id, status, skills) VALUES($1, $2, $3, $4)");
  }

  #[test]
  fn upsert_keeps_fixed_columns() {
    let sql = mappers().build_upsert("(user_id)", false);
    assert!(sql.starts_with("INSERT INTO profiles(id, user_id, status, skills) VALUES($1, $2, $3, $4)"));
    assert!(sql.contains("ON CONFLICT (user_id)"));
    assert!(sql.ends_with("DO UPDATE SET status = EXCLUDED.status, skills = EXCLUDED.skills"));
  }

}
