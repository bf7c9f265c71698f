use serde::{Deserialize, Serialize};

/// Statement type, as classified by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE, ALTER, DROP, TRUNCATE, ...
    Ddl,
    /// GRANT, REVOKE, CREATE USER, ...
    Dcl {
        /// The statement targets exactly one table, e.g. `GRANT SELECT ON t_order`.
        #[serde(default)]
        single_table: bool,
    },
    /// USE <schema>
    Use,
    ShowDatabases,
    ShowTables,
    ShowTableStatus,
    ShowCreateTable,
    ShowColumns,
    ShowIndex,
    /// SHOW VARIABLES, SHOW STATUS, and other server introspection.
    ShowOther,
    Describe,
    /// SET <parameter>
    SetParam,
    /// RESET <parameter>
    ResetParam,
}

impl StatementKind {
    /// SELECT.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Select)
    }

    /// INSERT, UPDATE or DELETE.
    pub fn is_dml(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert)
    }

    pub fn is_ddl(&self) -> bool {
        matches!(self, Self::Ddl)
    }

    pub fn is_dcl(&self) -> bool {
        matches!(self, Self::Dcl { .. })
    }

    /// DCL statement scoped to a single table.
    pub fn is_single_table_dcl(&self) -> bool {
        matches!(self, Self::Dcl { single_table: true })
    }

    /// Administrative, session and introspection statements.
    pub fn is_dal(&self) -> bool {
        matches!(
            self,
            Self::Use
                | Self::ShowDatabases
                | Self::ShowTables
                | Self::ShowTableStatus
                | Self::ShowCreateTable
                | Self::ShowColumns
                | Self::ShowIndex
                | Self::ShowOther
                | Self::Describe
                | Self::SetParam
                | Self::ResetParam
        )
    }
}
