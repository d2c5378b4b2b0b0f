//! The schema catalog: mapping tables from caller-facing graph properties
//! to SQL tables and columns, primary keys, join descriptors and the
//! driver flavor. Immutable once built; shared read-only by every
//! component of the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::errors::SchemaError;
use super::property::Prop;

/// Driver flavor. Selects dialect-specific behavior for name
/// normalization, column rendering and next-id lookup; everything else is
/// shared across drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Default,
    Postgres,
    Mysql,
    H2,
}

impl Driver {
    /// Canonicalize a property into SQL identifier form. All supported
    /// drivers currently share the default dash-to-underscore rule.
    pub fn sqlize(&self, prop: &Prop) -> Prop {
        prop.sqlized()
    }

    /// Render a SELECT-list entry: `table.col AS "table/col"`. The quoted
    /// alias form works on Postgres, MySQL and H2 alike.
    pub fn column_spec(&self, prop: &Prop) -> String {
        format!("{} AS \"{}\"", prop.qualified(), prop)
    }
}

/// Whether a join resolves to a single record or a list of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinArity {
    ToOne,
    #[default]
    ToMany,
}

/// How rows in two tables relate. The path holds 2 SQL properties for a
/// direct join or 4 for a many-to-many join through a link table.
///
/// Element 0 is always on the source table: the FK column for a forward
/// join, the source PK for a reverse or many-to-many join. The last
/// element is always on the target table. For length 4, elements 1 and 2
/// are the link table's left (source-referencing) and right
/// (target-referencing) columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDescriptor {
    pub path: Vec<Prop>,
    #[serde(default)]
    pub arity: JoinArity,
}

impl JoinDescriptor {
    pub fn new(path: Vec<Prop>, arity: JoinArity) -> Self {
        JoinDescriptor { path, arity }
    }

    /// The source-side column: carries the values that become the child
    /// root set during traversal.
    pub fn source_col(&self) -> &Prop {
        &self.path[0]
    }

    /// The column the child-level query filters on: the target PK for a
    /// forward join, the target FK for a reverse join, the link table's
    /// left column for a many-to-many join.
    pub fn filter_col(&self) -> &Prop {
        &self.path[1]
    }

    /// The target-side column, naming the target table.
    pub fn target_col(&self) -> &Prop {
        self.path.last().expect("descriptor path is non-empty")
    }

    pub fn is_through_link(&self) -> bool {
        self.path.len() == 4
    }

    /// The link table, for length-4 descriptors.
    pub fn link_table(&self) -> Option<&str> {
        if self.is_through_link() {
            self.path[1].table()
        } else {
            None
        }
    }

    /// The `(link right column, target column)` pair joined on at the
    /// child level, for length-4 descriptors.
    pub fn link_on(&self) -> Option<(&Prop, &Prop)> {
        if self.is_through_link() {
            Some((&self.path[2], &self.path[3]))
        } else {
            None
        }
    }
}

/// The schema value. Construct through [`SchemaBuilder`] or load from a
/// config file via [`super::config::SchemaConfig`].
#[derive(Debug, Clone)]
pub struct Schema {
    graph_to_sql: HashMap<Prop, Prop>,
    sql_to_graph: HashMap<Prop, Prop>,
    pks: HashMap<String, String>,
    joins: HashMap<Prop, JoinDescriptor>,
    driver: Driver,
    stable_child_order: bool,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// When set, child lists are sorted by child PK after grouping.
    /// Off by default: child ordering is otherwise driver-defined.
    pub fn stable_child_order(&self) -> bool {
        self.stable_child_order
    }

    /// Canonicalize a property for this schema's driver.
    pub fn sqlize(&self, prop: &Prop) -> Prop {
        self.driver.sqlize(prop)
    }

    /// Map a caller property to its SQL property: apply the graph-to-sql
    /// remap if one is declared, else identity, then normalize.
    pub fn graph_to_sql(&self, prop: &Prop) -> Prop {
        let remapped = self.graph_to_sql.get(prop).unwrap_or(prop);
        self.driver.sqlize(remapped)
    }

    /// Inverse of [`Schema::graph_to_sql`] on the remapped subset;
    /// identity elsewhere.
    pub fn sql_to_graph(&self, prop: &Prop) -> Prop {
        self.sql_to_graph.get(prop).unwrap_or(prop).clone()
    }

    /// The primary-key column of a table; `id` unless declared.
    pub fn pk(&self, table: &str) -> &str {
        self.pks.get(table).map(String::as_str).unwrap_or("id")
    }

    /// The primary key as a SQL property, `table/pk`.
    pub fn id_prop(&self, table: &str) -> Prop {
        Prop::new(table, self.pk(table))
    }

    /// The join descriptor registered for a SQL property, if any.
    pub fn join(&self, sql_prop: &Prop) -> Option<&JoinDescriptor> {
        self.joins.get(sql_prop)
    }

    /// One id property per table declared in `pks`.
    pub fn id_columns(&self) -> BTreeSet<Prop> {
        self.pks
            .keys()
            .map(|table| self.id_prop(table))
            .collect()
    }
}

/// Builder with build-time validation. Malformed schemas are programmer
/// errors and fail immediately.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    graph_to_sql: Vec<(Prop, Prop)>,
    pks: Vec<(String, String)>,
    joins: Vec<(Prop, JoinDescriptor)>,
    driver: Driver,
    stable_child_order: bool,
}

impl SchemaBuilder {
    pub fn graph_to_sql(mut self, from: &str, to: &str) -> Self {
        self.graph_to_sql.push((Prop::from(from), Prop::from(to)));
        self
    }

    pub fn pk(mut self, table: &str, column: &str) -> Self {
        self.pks.push((table.to_string(), column.to_string()));
        self
    }

    pub fn join(mut self, prop: &str, path: &[&str], arity: JoinArity) -> Self {
        let path = path.iter().map(|p| Prop::from(*p)).collect();
        self.joins
            .push((Prop::from(prop), JoinDescriptor::new(path, arity)));
        self
    }

    pub fn driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn stable_child_order(mut self, stable: bool) -> Self {
        self.stable_child_order = stable;
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let driver = self.driver;

        let mut graph_to_sql = HashMap::new();
        let mut sql_to_graph = HashMap::new();
        for (from, to) in self.graph_to_sql {
            if from.space().is_none() || to.space().is_none() {
                let entry = if from.space().is_none() { &from } else { &to };
                return Err(SchemaError::UnqualifiedMapping {
                    entry: entry.to_string(),
                });
            }
            let to_sql = driver.sqlize(&to);
            sql_to_graph.insert(to_sql.clone(), from.clone());
            graph_to_sql.insert(from, to);
        }

        let pks: HashMap<String, String> = self
            .pks
            .into_iter()
            .map(|(table, col)| (table.replace('-', "_"), col.replace('-', "_")))
            .collect();

        let mut joins = HashMap::new();
        for (prop, descriptor) in self.joins {
            let key = driver.sqlize(&prop);
            let source_table = match key.table() {
                Some(table) => table.to_string(),
                None => {
                    return Err(SchemaError::UnqualifiedJoin {
                        join: prop.to_string(),
                    })
                }
            };
            let len = descriptor.path.len();
            if len != 2 && len != 4 {
                return Err(SchemaError::BadDescriptorLength {
                    join: prop.to_string(),
                    len,
                });
            }
            let path: Vec<Prop> = descriptor.path.iter().map(|p| driver.sqlize(p)).collect();
            for entry in &path {
                if entry.space().is_none() {
                    return Err(SchemaError::UnqualifiedDescriptorEntry {
                        join: prop.to_string(),
                        entry: entry.to_string(),
                    });
                }
            }
            let first_table = path[0].table().expect("checked above");
            if first_table != source_table {
                return Err(SchemaError::DescriptorSourceMismatch {
                    join: prop.to_string(),
                    expected: source_table,
                    found: first_table.to_string(),
                });
            }
            joins.insert(
                key,
                JoinDescriptor::new(path, descriptor.arity),
            );
        }

        Ok(Schema {
            graph_to_sql,
            sql_to_graph,
            pks,
            joins,
            driver,
            stable_child_order: self.stable_child_order,
        })
    }
}
