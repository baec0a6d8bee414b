//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use balance_types::{
        BalanceRepository, Deposit, DepositStore, HistoryQuery, NewTransaction, OrderBy, OwnerId,
        RepoError, SortDirection, TransactionLedger,
    };
    use chrono::{Duration, Utc};

    use crate::SqliteRepo;
    use crate::types::map_db_error;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn funded(repo: &SqliteRepo, balance: i64) -> OwnerId {
        let owner = OwnerId::new();
        repo.create_deposit(&Deposit::from_parts(owner, balance).unwrap())
            .await
            .unwrap();
        owner
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Deposits
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_get_deposit() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 1000).await;

        let deposit = repo.get_deposit(owner).await.unwrap().unwrap();

        assert_eq!(deposit.owner_id, owner);
        assert_eq!(deposit.balance(), 1000);
    }

    #[tokio::test]
    async fn test_get_deposit_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_deposit(OwnerId::new()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(repo.count_deposits().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_deposit_twice_conflicts() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 0).await;

        let result = repo.create_deposit(&Deposit::new(owner)).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert_eq!(repo.count_deposits().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_deposit() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 1000).await;

        let mut deposit = repo.get_deposit(owner).await.unwrap().unwrap();
        deposit.apply(500).unwrap();
        repo.update_deposit(&deposit).await.unwrap();

        let stored = repo.get_deposit(owner).await.unwrap().unwrap();
        assert_eq!(stored.balance(), 1500);
    }

    #[tokio::test]
    async fn test_update_missing_deposit() {
        let repo = setup_repo().await;

        let result = repo.update_deposit(&Deposit::new(OwnerId::new())).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_or_create_deposit() {
        let repo = setup_repo().await;
        let owner = OwnerId::new();

        let created = repo.get_or_create_deposit(owner).await.unwrap();
        assert_eq!(created.balance(), 0);
        assert_eq!(repo.count_deposits().await.unwrap(), 1);

        let existing = funded(&repo, 250).await;
        let found = repo.get_or_create_deposit(existing).await.unwrap();
        assert_eq!(found.balance(), 250);

        let again = repo.get_or_create_deposit(owner).await.unwrap();
        assert_eq!(again, created);
        assert_eq!(repo.count_deposits().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_negative_balance_hits_check_constraint() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 10).await;

        let err = sqlx::query("UPDATE deposits SET balance = -1 WHERE owner_id = ?")
            .bind(owner.to_string())
            .execute(repo.pool())
            .await
            .unwrap_err();

        assert!(matches!(
            map_db_error(err),
            RepoError::ConstraintViolation(_)
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let repo = setup_repo().await;
        let owner = OwnerId::new();

        let first = repo
            .append_transaction(NewTransaction::top_up(owner, 500, "visa".into()))
            .await
            .unwrap();
        let second = repo
            .append_transaction(NewTransaction::withdrawal(owner, 100, "coffee".into()))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(repo.count_transactions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_appended_transaction_reads_back_unchanged() {
        let repo = setup_repo().await;
        let (alice, bob) = (OwnerId::new(), OwnerId::new());

        let tx = repo
            .append_transaction(NewTransaction::transfer(alice, bob, 300, "thanks for dinner!".into()))
            .await
            .unwrap();

        let history = repo.list_for_account(&HistoryQuery::all(bob)).await.unwrap();
        assert_eq!(history, vec![tx]);
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_entries() {
        let repo = setup_repo().await;
        let owner = OwnerId::new();

        let result = repo
            .append_transaction(NewTransaction::top_up(owner, 0, String::new()))
            .await;
        assert!(matches!(result, Err(RepoError::ConstraintViolation(_))));

        let mut orphan = NewTransaction::top_up(owner, 10, String::new());
        orphan.recipient_id = None;
        let result = repo.append_transaction(orphan).await;
        assert!(matches!(result, Err(RepoError::ConstraintViolation(_))));

        assert_eq!(repo.count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_either_side() {
        let repo = setup_repo().await;
        let (alice, bob, carol) = (OwnerId::new(), OwnerId::new(), OwnerId::new());

        for tx in [
            NewTransaction::top_up(alice, 1000, String::new()),
            NewTransaction::transfer(alice, bob, 300, String::new()),
            NewTransaction::top_up(carol, 50, String::new()),
            NewTransaction::withdrawal(alice, 200, String::new()),
        ] {
            repo.append_transaction(tx).await.unwrap();
        }

        let history = repo.list_for_account(&HistoryQuery::all(alice)).await.unwrap();
        let amounts: Vec<i64> = history.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![1000, 300, 200]);

        let history = repo.list_for_account(&HistoryQuery::all(bob)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender_id, Some(alice));
    }

    #[tokio::test]
    async fn test_list_ordering_and_pagination() {
        let repo = setup_repo().await;
        let owner = OwnerId::new();
        let base = Utc::now();

        // amounts 300, 100, 300, 200 with dates running backwards
        let mut ids = Vec::new();
        for (i, amount) in [300, 100, 300, 200].into_iter().enumerate() {
            let mut tx = NewTransaction::top_up(owner, amount, format!("#{i}"));
            tx.transaction_date = base - Duration::minutes(i as i64);
            ids.push(repo.append_transaction(tx).await.unwrap().id);
        }

        let query = HistoryQuery {
            order: Some((OrderBy::Amount, SortDirection::Desc)),
            ..HistoryQuery::all(owner)
        };
        let rows = repo.list_for_account(&query).await.unwrap();
        let got: Vec<_> = rows.iter().map(|tx| tx.id).collect();
        assert_eq!(got, vec![ids[2], ids[0], ids[3], ids[1]]);

        let query = HistoryQuery {
            order: Some((OrderBy::TransactionDate, SortDirection::Asc)),
            offset: 1,
            limit: Some(2),
            owner_id: owner,
        };
        let rows = repo.list_for_account(&query).await.unwrap();
        let got: Vec<_> = rows.iter().map(|tx| tx.id).collect();
        assert_eq!(got, vec![ids[2], ids[1]]);

        let query = HistoryQuery {
            offset: 3,
            ..HistoryQuery::all(owner)
        };
        let rows = repo.list_for_account(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, ids[3]);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Units of work
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_unit_of_work_commit() {
        let repo = setup_repo().await;
        let owner = OwnerId::new();

        let uow = repo.begin().await.unwrap();
        let mut deposit = Deposit::new(owner);
        uow.create_deposit(&deposit).await.unwrap();
        deposit.credit(700).unwrap();
        uow.update_deposit(&deposit).await.unwrap();
        uow.append_transaction(NewTransaction::top_up(owner, 700, String::new()))
            .await
            .unwrap();

        // reads inside the unit see its own writes
        let seen = uow.get_deposit(owner).await.unwrap().unwrap();
        assert_eq!(seen.balance(), 700);

        uow.commit().await.unwrap();

        assert_eq!(repo.get_deposit(owner).await.unwrap().unwrap().balance(), 700);
        assert_eq!(repo.count_transactions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unit_of_work_rolls_back_on_drop() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 1000).await;

        {
            let uow = repo.begin().await.unwrap();
            let mut deposit = uow.get_deposit(owner).await.unwrap().unwrap();
            deposit.debit(400).unwrap();
            uow.update_deposit(&deposit).await.unwrap();
            uow.append_transaction(NewTransaction::withdrawal(owner, 400, String::new()))
                .await
                .unwrap();
            // dropped without commit
        }

        assert_eq!(repo.get_deposit(owner).await.unwrap().unwrap().balance(), 1000);
        assert_eq!(repo.count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unit_of_work_rolls_back_after_failed_append() {
        let repo = setup_repo().await;
        let owner = funded(&repo, 1000).await;

        {
            let uow = repo.begin().await.unwrap();
            let mut deposit = uow.get_deposit(owner).await.unwrap().unwrap();
            deposit.debit(400).unwrap();
            uow.update_deposit(&deposit).await.unwrap();

            let result = uow
                .append_transaction(NewTransaction::withdrawal(owner, -400, String::new()))
                .await;
            assert!(result.is_err());
        }

        assert_eq!(repo.get_deposit(owner).await.unwrap().unwrap().balance(), 1000);
    }
}
