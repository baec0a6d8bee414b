//! Transaction history query.

use serde::{Deserialize, Serialize};

use super::deposit::OwnerId;
use super::transaction::Transaction;

/// Column to order history by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    TransactionDate,
    Amount,
}

impl OrderBy {
    pub fn column(&self) -> &'static str {
        match self {
            OrderBy::TransactionDate => "transaction_date",
            OrderBy::Amount => "amount",
        }
    }
}

impl std::str::FromStr for OrderBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction_date" => Ok(OrderBy::TransactionDate),
            "amount" => Ok(OrderBy::Amount),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(()),
        }
    }
}

/// Page of a deposit's history, as sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub owner_id: OwnerId,
    /// `None` keeps insertion order.
    pub order: Option<(OrderBy, SortDirection)>,
    pub offset: i64,
    /// `None` means no limit.
    pub limit: Option<i64>,
}

impl HistoryQuery {
    /// Everything for `owner_id`, in insertion order.
    pub fn all(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            order: None,
            offset: 0,
            limit: None,
        }
    }

    /// Applies the filter, ordering and pagination to an in-memory ledger.
    ///
    /// Ties are broken by id in the requested direction, matching the SQL
    /// adapters.
    pub fn select<'a, I>(&self, ledger: I) -> Vec<Transaction>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut rows: Vec<Transaction> = ledger
            .into_iter()
            .filter(|tx| tx.involves(self.owner_id))
            .cloned()
            .collect();

        match self.order {
            None => rows.sort_by_key(|tx| tx.id),
            Some((column, direction)) => rows.sort_by(|a, b| {
                let ord = match column {
                    OrderBy::TransactionDate => a.transaction_date.cmp(&b.transaction_date),
                    OrderBy::Amount => a.amount.cmp(&b.amount),
                }
                .then(a.id.cmp(&b.id));
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }),
        }

        let offset = usize::try_from(self.offset).unwrap_or(0);
        let limit = self
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        rows.into_iter().skip(offset).take(limit).collect()
    }
}
