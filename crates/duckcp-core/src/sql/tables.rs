use std::{convert::Infallible, ops::ControlFlow};

use sqlparser::{
    ast::{Query, TableFactor, Visit, Visitor},
    dialect::DuckDbDialect,
    parser::Parser,
};

use crate::error::DuckcpResult;

/// Returns the tables a script reads or writes, in order of first appearance.
///
/// Names bound by a `WITH` clause are not reported while they are in scope.
/// Table functions such as `read_csv(...)` are skipped.
pub fn referenced_tables(sql: &str) -> DuckcpResult<Vec<String>> {
    let statements = Parser::parse_sql(&DuckDbDialect {}, sql)?;

    let mut visitor = TableVisitor::default();
    for statement in &statements {
        let _ = statement.visit(&mut visitor);
    }
    Ok(visitor.tables)
}

/// CTEs declared by one query. A name becomes visible once its own body has been visited, so a
/// body can still read a real table of the same name or one shadowed by a later CTE.
struct Scope {
    ctes: Vec<(String, usize)>,
    visible: usize,
}

impl Scope {
    fn visible(&self) -> impl Iterator<Item = &str> {
        self.ctes[..self.visible].iter().map(|(name, _)| name.as_str())
    }
}

fn address(query: &Query) -> usize {
    query as *const Query as usize
}

#[derive(Default)]
struct TableVisitor {
    scopes: Vec<Scope>,
    tables: Vec<String>,
}

impl TableVisitor {
    fn in_scope(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .flat_map(Scope::visible)
            .any(|cte| cte.eq_ignore_ascii_case(name))
    }
}

impl Visitor for TableVisitor {
    type Break = Infallible;

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        let (ctes, recursive) = query
            .with
            .as_ref()
            .map(|with| {
                let ctes: Vec<_> = with
                    .cte_tables
                    .iter()
                    .map(|cte| (cte.alias.name.value.clone(), address(&cte.query)))
                    .collect();
                (ctes, with.recursive)
            })
            .unwrap_or_default();
        // a recursive CTE may reference itself and its siblings
        let visible = if recursive { ctes.len() } else { 0 };
        self.scopes.push(Scope { ctes, visible });
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        self.scopes.pop();
        if let Some(parent) = self.scopes.last_mut() {
            if parent
                .ctes
                .get(parent.visible)
                .is_some_and(|(_, body)| *body == address(query))
            {
                parent.visible += 1;
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        if let TableFactor::Table { name, args, .. } = table_factor {
            if args.is_some() {
                return ControlFlow::Continue(());
            }
            if let Some(ident) = name.0.last().and_then(|part| part.as_ident()) {
                let table = ident.value.as_str();
                if !self.in_scope(table) && !self.tables.iter().any(|t| t == table) {
                    self.tables.push(table.to_string());
                }
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let tables = referenced_tables("select * from users where id = 1").unwrap();
        assert_eq!(tables, vec!["users"]);
    }

    #[test]
    fn test_join_deduplicates() {
        let tables = referenced_tables(
            "select * from orders o join users u on o.user_id = u.id join orders p on p.id = o.id",
        )
        .unwrap();
        assert_eq!(tables, vec!["orders", "users"]);
    }

    #[test]
    fn test_cte_alias_ignored() {
        let sql = "with recent as (select * from orders where day > 3) \
                   select * from recent join users on recent.uid = users.id";
        let tables = referenced_tables(sql).unwrap();
        assert_eq!(tables, vec!["orders", "users"]);
    }

    #[test]
    fn test_cte_body_reads_table_of_same_name() {
        let sql = "with users as (select * from users where active) select * from users";
        let tables = referenced_tables(sql).unwrap();
        assert_eq!(tables, vec!["users"]);
    }

    #[test]
    fn test_cte_sees_only_earlier_siblings() {
        let sql = "with a as (select * from b), b as (select * from a) select * from a join b on true";
        let tables = referenced_tables(sql).unwrap();
        assert_eq!(tables, vec!["b"]);
    }

    #[test]
    fn test_recursive_cte_references_itself() {
        let sql = "with recursive n as (select 1 as i union all select i + 1 from n where i < 3) \
                   select * from n";
        let tables = referenced_tables(sql).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_cte_alias_out_of_scope() {
        let sql = "select * from (with t as (select 1 as x) select * from t) a join t on true";
        let tables = referenced_tables(sql).unwrap();
        assert_eq!(tables, vec!["t"]);
    }

    #[test]
    fn test_subquery_and_qualified_names() {
        let sql = "select * from main.users where id in (select uid from audit.events)";
        let tables = referenced_tables(sql).unwrap();
        assert_eq!(tables, vec!["users", "events"]);
    }

    #[test]
    fn test_table_function_skipped() {
        let tables = referenced_tables("select * from read_csv('data.csv')").unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_parse_error() {
        assert!(referenced_tables("select * from (").is_err());
    }
}
