//! Status lookups the REST and RPC routes are built on.
//!
//! Hosts are found by name, alias or address and service groups by name or
//! alias. Lookups that first resolve a host or group return no records when
//! nothing matches.

use super::Gateway;
use crate::dispatch::CommandDispatcher;
use crate::error::QueryError;
use crate::query::{Filter, Operator, Query, Table};
use crate::response::Record;
use crate::transport::Transport;

const HOST_KEYS: [&str; 3] = ["name", "alias", "address"];
const GROUP_KEYS: [&str; 2] = ["name", "alias"];

impl<T: Transport, D: CommandDispatcher> Gateway<T, D> {
    /// Every row of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the query fails.
    pub fn list(&self, table: Table) -> Result<Vec<Record>, QueryError> {
        self.run(&Query::builder(table).build()?)
    }

    /// Hosts whose name, alias or address equals `name`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the query fails.
    pub fn find_hosts(&self, name: &str) -> Result<Vec<Record>, QueryError> {
        self.run(&host_lookup(name, &[])?)
    }

    /// Services of the host found by name, alias or address.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when either query fails.
    pub fn host_services(&self, name: &str) -> Result<Vec<Record>, QueryError> {
        let Some(host) = self.resolve(&host_lookup(name, &["name"])?)? else {
            return Ok(Vec::new());
        };
        self.run(
            &Query::builder(Table::Services)
                .filter(Filter::eq("host_name", host))
                .build()?,
        )
    }

    /// The service described as `service` on the host found by name, alias
    /// or address.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when either query fails.
    pub fn host_service(&self, name: &str, service: &str) -> Result<Vec<Record>, QueryError> {
        let Some(host) = self.resolve(&host_lookup(name, &["name"])?)? else {
            return Ok(Vec::new());
        };
        self.run(
            &Query::builder(Table::Services)
                .filter(Filter::eq("host_name", host).and(Filter::eq("description", service)))
                .build()?,
        )
    }

    /// Service groups whose name or alias equals `name`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the query fails.
    pub fn find_servicegroups(&self, name: &str) -> Result<Vec<Record>, QueryError> {
        self.run(&group_lookup(name, &[])?)
    }

    /// Services belonging to the service group found by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when either query fails.
    pub fn servicegroup_services(&self, name: &str) -> Result<Vec<Record>, QueryError> {
        let Some(group) = self.resolve(&group_lookup(name, &["name"])?)? else {
            return Ok(Vec::new());
        };
        self.run(
            &Query::builder(Table::Services)
                .filter(Filter::predicate("groups", Operator::Contains, group))
                .build()?,
        )
    }

    /// Every host group.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the query fails.
    pub fn hostgroups(&self) -> Result<Vec<Record>, QueryError> {
        self.list(Table::Hostgroups)
    }

    /// Program status of the monitoring core, a single record.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the query fails.
    pub fn program_status(&self) -> Result<Vec<Record>, QueryError> {
        self.list(Table::Status)
    }

    fn resolve(&self, query: &Query) -> Result<Option<String>, QueryError> {
        let records = self.run(query)?;
        Ok(records
            .first()
            .and_then(|record| record.get_str("name"))
            .map(str::to_owned))
    }
}

fn host_lookup(name: &str, columns: &[&str]) -> Result<Query, QueryError> {
    Ok(Query::builder(Table::Hosts)
        .columns(columns.iter().copied())
        .filter(Filter::any_of(HOST_KEYS, name))
        .build()?)
}

fn group_lookup(name: &str, columns: &[&str]) -> Result<Query, QueryError> {
    Ok(Query::builder(Table::Servicegroups)
        .columns(columns.iter().copied())
        .filter(Filter::any_of(GROUP_KEYS, name))
        .build()?)
}
