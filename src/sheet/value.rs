//! Runtime values (spec.md §4.9): `Number`, `Query`, `Function`, and
//! structural `Array`.

use std::cell::RefCell;
use std::rc::Rc;

use rust_decimal::Decimal;

use crate::domain::Posting;
use crate::query::glob::AccountGlob;
use crate::store::Snapshot;

use super::env::FunctionDef;

/// A predicate tree over postings, composed by `AND`/`OR` (spec.md §4.9).
/// `postings { "pattern" }` literals are the leaves.
#[derive(Debug, Clone)]
pub enum QueryNode {
    Like(String),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
}

impl QueryNode {
    pub fn matches(&self, glob_cache: &mut GlobCache, posting: &Posting) -> bool {
        match self {
            QueryNode::Like(pattern) => glob_cache.compiled(pattern).matches(&posting.account),
            QueryNode::And(a, b) => a.matches(glob_cache, posting) && b.matches(glob_cache, posting),
            QueryNode::Or(a, b) => a.matches(glob_cache, posting) || b.matches(glob_cache, posting),
        }
    }
}

/// Compiles each distinct glob pattern at most once per resolution.
#[derive(Default)]
pub struct GlobCache {
    compiled: std::collections::HashMap<String, AccountGlob>,
}

impl GlobCache {
    fn compiled(&mut self, pattern: &str) -> &AccountGlob {
        self.compiled
            .entry(pattern.to_string())
            .or_insert_with(|| AccountGlob::compile(pattern).unwrap_or_else(|_| AccountGlob::compile("").unwrap()))
    }
}

/// Wraps a [`QueryNode`] plus a memoized resolution against a snapshot, so
/// `resolve` only walks the posting list once no matter how many times a
/// sheet line references the same query (spec.md §4.9).
#[derive(Clone)]
pub struct Query {
    node: Rc<QueryNode>,
    resolved: Rc<RefCell<Option<Rc<Vec<Posting>>>>>,
}

impl Query {
    pub fn new(node: QueryNode) -> Self {
        Self { node: Rc::new(node), resolved: Rc::new(RefCell::new(None)) }
    }

    pub fn and(self, other: Query) -> Query {
        Query::new(QueryNode::And(
            Box::new(Rc::try_unwrap(self.node).unwrap_or_else(|rc| (*rc).clone())),
            Box::new(Rc::try_unwrap(other.node).unwrap_or_else(|rc| (*rc).clone())),
        ))
    }

    pub fn or(self, other: Query) -> Query {
        Query::new(QueryNode::Or(
            Box::new(Rc::try_unwrap(self.node).unwrap_or_else(|rc| (*rc).clone())),
            Box::new(Rc::try_unwrap(other.node).unwrap_or_else(|rc| (*rc).clone())),
        ))
    }

    pub fn resolve(&self, snapshot: &Snapshot) -> Rc<Vec<Posting>> {
        if let Some(cached) = self.resolved.borrow().as_ref() {
            return Rc::clone(cached);
        }
        let mut cache = GlobCache::default();
        let matched: Vec<Posting> = snapshot
            .postings
            .iter()
            .filter(|p| self.node.matches(&mut cache, p))
            .cloned()
            .collect();
        let result = Rc::new(matched);
        *self.resolved.borrow_mut() = Some(Rc::clone(&result));
        result
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Query({:?})", self.node)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(Decimal),
    Query(Query),
    Function(FunctionDef),
    Array(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Query(_) => "Query",
            Value::Function(_) => "Function",
            Value::Array(_) => "Array",
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Value::Query(q) => Some(q),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostingStatus;
    use chrono::NaiveDate;

    fn posting(account: &str) -> Posting {
        Posting {
            transaction_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payee: "p".into(),
            account: account.into(),
            commodity: "INR".into(),
            quantity: Decimal::ZERO,
            amount: Decimal::ZERO,
            status: PostingStatus::Cleared,
            transaction_begin_line: 1,
            end_line: 2,
            file_name: "j.ledger".into(),
            forecast: false,
            tag_recurring: None,
            posting_index: 0,
        }
    }

    #[test]
    fn resolve_memoizes_result() {
        let snapshot = Snapshot {
            postings: vec![posting("Assets:Checking"), posting("Expenses:Food")],
            prices: Default::default(),
        };
        let query = Query::new(QueryNode::Like("Assets:*".into()));
        let first = query.resolve(&snapshot);
        let second = query.resolve(&snapshot);
        assert_eq!(first.len(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn or_composes_two_predicates() {
        let snapshot = Snapshot {
            postings: vec![posting("Assets:Checking"), posting("Expenses:Food")],
            prices: Default::default(),
        };
        let query = Query::new(QueryNode::Like("Assets:*".into())).or(Query::new(QueryNode::Like("Expenses:*".into())));
        assert_eq!(query.resolve(&snapshot).len(), 2);
    }
}
