//! Pure schema diff: desired structure + live snapshot in, DDL out.
//!
//! Statement order for an existing table:
//!
//! 1. column additions and modifications, in definition order
//! 2. foreign key drops
//! 3. every other constraint drop
//! 4. constraint additions
//!
//! Foreign keys go first because an active one can block dropping the
//! unique index or altering the column it depends on. Columns that only
//! exist in the live table are left alone, and primary keys are never
//! dropped.

use crate::core::schema::{ColumnDefinition, ConstraintKind, LiveColumn, LiveTable, TableStructure};
use crate::core::traits::Dialect;
use crate::dialect::defaults_match;

/// The single statement creating `table` from scratch.
pub fn plan_create<D: Dialect + ?Sized>(dialect: &D, table: &str, desired: &TableStructure) -> String {
    dialect.create_table(table, desired)
}

/// Statements converging an existing table on `desired`. Empty when the
/// live table already matches.
pub fn plan_update<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    desired: &TableStructure,
    live: &LiveTable,
) -> Vec<String> {
    let mut statements = Vec::new();

    for column in &desired.columns {
        match live.column(&column.name) {
            None => statements.push(dialect.add_column(table, column)),
            Some(existing) if column_changed(dialect, column, existing) => {
                statements.push(dialect.modify_column(table, column))
            }
            Some(_) => {}
        }
    }

    let (fk_drops, other_drops): (Vec<_>, Vec<_>) = live
        .constraints
        .iter()
        .filter(|c| c.kind != ConstraintKind::PrimaryKey && desired.constraint(&c.name).is_none())
        .partition(|c| c.kind == ConstraintKind::ForeignKey);
    statements.extend(fk_drops.into_iter().map(|c| dialect.drop_constraint(table, c)));
    statements.extend(other_drops.into_iter().map(|c| dialect.drop_constraint(table, c)));

    let has_primary_key = live.has_primary_key();
    for constraint in &desired.constraints {
        if live.constraint(&constraint.name).is_some() {
            continue;
        }
        if constraint.kind() == ConstraintKind::PrimaryKey && has_primary_key {
            continue;
        }
        statements.push(dialect.add_constraint(table, constraint));
    }

    statements
}

/// Whether an existing column differs from its definition in type,
/// nullability or default.
pub fn column_changed<D: Dialect + ?Sized>(
    dialect: &D,
    desired: &ColumnDefinition,
    live: &LiveColumn,
) -> bool {
    if !dialect.normalize_type(live).satisfies(&desired.column_type) {
        return true;
    }
    if desired.nullable != live.nullable {
        return true;
    }
    // The sequence/auto-increment owns a serial column's default.
    if desired.column_type.is_serial() {
        return false;
    }
    !defaults_match(desired.default.as_deref(), live.default.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnType, ConstraintDefinition, LiveConstraint};
    use crate::drivers::{MysqlDialect, PostgresDialect};

    fn sample() -> TableStructure {
        TableStructure {
            columns: vec![
                ColumnDefinition::new("id", ColumnType::Serial, false, None),
                ColumnDefinition::new("name", ColumnType::Varchar(50), false, None),
                ColumnDefinition::new("active", ColumnType::Boolean, true, Some("true".into())),
            ],
            constraints: vec![ConstraintDefinition::new("pk_t", "PRIMARY KEY (id)")],
        }
    }

    /// What MySQL reports after creating `sample()`.
    fn mysql_live() -> LiveTable {
        LiveTable {
            columns: vec![
                LiveColumn::from_type_full("id", "int(11)", false, None),
                LiveColumn::from_type_full("name", "varchar(50)", false, None),
                LiveColumn::from_type_full("active", "tinyint(1)", true, Some("1".into())),
            ],
            constraints: vec![LiveConstraint::new("PRIMARY", "PRIMARY KEY")],
        }
    }

    fn pg_column(name: &str, data_type: &str, size: u32, nullable: bool, default: Option<&str>) -> LiveColumn {
        LiveColumn {
            name: name.to_string(),
            type_full: data_type.to_string(),
            data_type: data_type.to_string(),
            size,
            nullable,
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn test_create_scenario() {
        let sql = plan_create(&MysqlDialect::new(), "t", &sample());
        assert_eq!(
            sql,
            "CREATE TABLE t (id integer NOT NULL AUTO_INCREMENT, name varchar(50) NOT NULL, \
             active boolean NULL DEFAULT true, CONSTRAINT pk_t PRIMARY KEY (id)) ENGINE=InnoDB;"
        );
    }

    #[test]
    fn test_matching_table_gives_empty_plan() {
        assert!(plan_update(&MysqlDialect::new(), "t", &sample(), &mysql_live()).is_empty());

        let pg_live = LiveTable {
            columns: vec![
                pg_column("id", "integer", 0, false, Some("nextval('t_id_seq'::regclass)")),
                pg_column("name", "character varying", 50, false, None),
                pg_column("active", "boolean", 0, true, Some("true")),
            ],
            constraints: vec![LiveConstraint::new("pk_t", "PRIMARY KEY")],
        };
        assert!(plan_update(&PostgresDialect::new(), "t", &sample(), &pg_live).is_empty());
    }

    #[test]
    fn test_missing_column_is_added_and_extra_column_kept() {
        let mut live = mysql_live();
        live.columns.retain(|c| c.name != "active");
        live.columns
            .push(LiveColumn::from_type_full("legacy", "varchar(10)", true, None));

        let plan = plan_update(&MysqlDialect::new(), "t", &sample(), &live);
        assert_eq!(
            plan,
            vec!["ALTER TABLE t ADD active boolean NULL DEFAULT true;"]
        );
    }

    #[test]
    fn test_varchar_size_change_is_modified() {
        let mut live = mysql_live();
        live.columns[1] = LiveColumn::from_type_full("name", "varchar(30)", false, None);
        let plan = plan_update(&MysqlDialect::new(), "t", &sample(), &live);
        assert_eq!(plan, vec!["ALTER TABLE t MODIFY name varchar(50) NOT NULL;"]);
    }

    #[test]
    fn test_nullability_and_default_changes() {
        let dialect = MysqlDialect::new();
        let desired = ColumnDefinition::new("qty", ColumnType::Integer, false, Some("0".into()));

        let same = LiveColumn::from_type_full("qty", "int(11)", false, Some("0".into()));
        assert!(!column_changed(&dialect, &desired, &same));

        let nullable = LiveColumn::from_type_full("qty", "int(11)", true, Some("0".into()));
        assert!(column_changed(&dialect, &desired, &nullable));

        let other_default = LiveColumn::from_type_full("qty", "int(11)", false, Some("1".into()));
        assert!(column_changed(&dialect, &desired, &other_default));

        let wrong_type = LiveColumn::from_type_full("qty", "bigint(20)", false, Some("0".into()));
        assert!(column_changed(&dialect, &desired, &wrong_type));
    }

    #[test]
    fn test_serial_default_is_ignored() {
        let dialect = PostgresDialect::new();
        let desired = ColumnDefinition::new("id", ColumnType::Serial, false, None);
        let live = pg_column("id", "integer", 0, false, Some("nextval('t_id_seq'::regclass)"));
        assert!(!column_changed(&dialect, &desired, &live));
    }

    #[test]
    fn test_empty_string_defaults_converge_on_mysql() {
        let dialect = MysqlDialect::new();
        let empty = ColumnDefinition::new("nota", ColumnType::Varchar(10), true, Some("''".into()));
        let live = LiveColumn::from_type_full("nota", "varchar(10)", true, Some(String::new()));
        assert!(!column_changed(&dialect, &empty, &live));

        let blank = ColumnDefinition::new("nota", ColumnType::Varchar(10), true, Some("' '".into()));
        let live = LiveColumn::from_type_full("nota", "varchar(10)", true, Some(" ".into()));
        assert!(!column_changed(&dialect, &blank, &live));

        let no_default = LiveColumn::from_type_full("nota", "varchar(10)", true, None);
        assert!(column_changed(&dialect, &empty, &no_default));
    }

    #[test]
    fn test_foreign_key_drops_come_first() {
        let mut desired = sample();
        desired
            .constraints
            .push(ConstraintDefinition::new("uniq_name", "UNIQUE (name)"));

        let mut live = mysql_live();
        live.constraints = vec![
            LiveConstraint::new("PRIMARY", "PRIMARY KEY"),
            LiveConstraint::new("uniq_old", "UNIQUE"),
            LiveConstraint::new("fk_old", "FOREIGN KEY"),
            LiveConstraint::new("chk_old", "CHECK"),
        ];

        let plan = plan_update(&MysqlDialect::new(), "t", &desired, &live);
        assert_eq!(
            plan,
            vec![
                "ALTER TABLE t DROP FOREIGN KEY fk_old;",
                "ALTER TABLE t DROP INDEX uniq_old;",
                "ALTER TABLE t DROP CHECK chk_old;",
                "ALTER TABLE t ADD CONSTRAINT uniq_name UNIQUE (name);",
            ]
        );
    }

    #[test]
    fn test_column_changes_precede_constraint_changes() {
        let mut desired = sample();
        desired.constraints.push(ConstraintDefinition::new(
            "fk_pais",
            "FOREIGN KEY (name) REFERENCES paises (codpais)",
        ));
        let mut live = mysql_live();
        live.columns.pop();
        live.constraints.push(LiveConstraint::new("fk_stale", "FOREIGN KEY"));

        let plan = plan_update(&MysqlDialect::new(), "t", &desired, &live);
        assert_eq!(plan.len(), 3);
        assert!(plan[0].starts_with("ALTER TABLE t ADD active"));
        assert_eq!(plan[1], "ALTER TABLE t DROP FOREIGN KEY fk_stale;");
        assert!(plan[2].starts_with("ALTER TABLE t ADD CONSTRAINT fk_pais"));
    }

    #[test]
    fn test_primary_key_is_never_dropped_or_duplicated() {
        let desired = TableStructure {
            columns: sample().columns,
            constraints: vec![ConstraintDefinition::new("pk_new", "PRIMARY KEY (id)")],
        };
        // Live PK under another name: neither dropped nor re-added.
        let plan = plan_update(&MysqlDialect::new(), "t", &desired, &mysql_live());
        assert!(plan.is_empty());

        // No live PK: the desired one is added.
        let mut live = mysql_live();
        live.constraints.clear();
        let plan = plan_update(&MysqlDialect::new(), "t", &desired, &live);
        assert_eq!(
            plan,
            vec!["ALTER TABLE t ADD CONSTRAINT pk_new PRIMARY KEY (id);"]
        );
    }

    #[test]
    fn test_postgres_update_statements() {
        let live = LiveTable {
            columns: vec![
                pg_column("id", "integer", 0, false, Some("nextval('t_id_seq'::regclass)")),
                pg_column("name", "character varying", 50, true, None),
            ],
            constraints: vec![
                LiveConstraint::new("pk_t", "PRIMARY KEY"),
                LiveConstraint::new("t_name_key", "UNIQUE"),
            ],
        };
        let plan = plan_update(&PostgresDialect::new(), "t", &sample(), &live);
        assert_eq!(
            plan,
            vec![
                "ALTER TABLE t ALTER COLUMN name TYPE character varying(50) \
                 USING name::character varying(50), ALTER COLUMN name SET NOT NULL, \
                 ALTER COLUMN name DROP DEFAULT;",
                "ALTER TABLE t ADD COLUMN active boolean NULL DEFAULT true;",
                "ALTER TABLE t DROP CONSTRAINT t_name_key;",
            ]
        );
    }
}
