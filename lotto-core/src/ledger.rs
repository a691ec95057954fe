use crate::credentials::PasswordHash;
use crate::error::{LotteryError, Result};
use crate::types::{AccountNo, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_no: AccountNo,
    pub username: String,
    pub email: String,
    pub credential: PasswordHash,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

/// Registration input; the password is hashed before anything is stored.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Account balances. All balance changes go through `debit`, `credit` and
/// `withdraw`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    accounts: BTreeMap<AccountNo, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn account(&self, account_no: &AccountNo) -> Result<&Account> {
        self.accounts
            .get(account_no)
            .ok_or_else(|| LotteryError::AccountNotFound(account_no.to_string()))
    }

    fn account_mut(&mut self, account_no: &AccountNo) -> Result<&mut Account> {
        self.accounts
            .get_mut(account_no)
            .ok_or_else(|| LotteryError::AccountNotFound(account_no.to_string()))
    }

    pub fn contains(&self, account_no: &AccountNo) -> bool {
        self.accounts.contains_key(account_no)
    }

    pub fn register(&mut self, registration: Registration) -> Result<Account> {
        let username = registration.username.trim();
        let email = registration.email.trim();

        if username.is_empty() {
            return Err(LotteryError::validation("username is required"));
        }
        if email.is_empty() {
            return Err(LotteryError::validation("email is required"));
        }
        if registration.password.is_empty() {
            return Err(LotteryError::validation("password is required"));
        }

        if self
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email))
        {
            return Err(LotteryError::EmailAlreadyRegistered(email.to_string()));
        }

        let mut rng = rand::thread_rng();
        let account_no = loop {
            let candidate = AccountNo::generate(&mut rng);
            if !self.accounts.contains_key(&candidate) {
                break candidate;
            }
        };

        let account = Account {
            account_no: account_no.clone(),
            username: username.to_string(),
            email: email.to_string(),
            credential: PasswordHash::create(&registration.password),
            balance: Amount::ZERO,
            created_at: Utc::now(),
        };
        self.accounts.insert(account_no.clone(), account.clone());

        tracing::info!("Registered account {} for '{}'", account_no, username);
        Ok(account)
    }

    pub fn authenticate(&self, account_no: &AccountNo, password: &str) -> Result<&Account> {
        match self.accounts.get(account_no) {
            Some(account) if account.credential.verify(password) => Ok(account),
            _ => Err(LotteryError::InvalidCredentials),
        }
    }

    pub fn balance(&self, account_no: &AccountNo) -> Result<Amount> {
        Ok(self.account(account_no)?.balance)
    }

    pub fn debit(&mut self, account_no: &AccountNo, amount: Amount) -> Result<Amount> {
        let account = self.account_mut(account_no)?;
        let remaining =
            account
                .balance
                .checked_sub(amount)
                .ok_or(LotteryError::InsufficientFunds {
                    need: amount,
                    available: account.balance,
                })?;
        account.balance = remaining;

        tracing::debug!("Debited {} from {}", amount, account_no);
        Ok(remaining)
    }

    pub fn credit(&mut self, account_no: &AccountNo, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(LotteryError::invalid_amount(
                "credit amount must be greater than 0",
            ));
        }

        let account = self.account_mut(account_no)?;
        let updated = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LotteryError::invalid_amount("balance overflow"))?;
        account.balance = updated;

        tracing::debug!("Credited {} to {}", amount, account_no);
        Ok(updated)
    }

    /// Debit with the withdrawal minimum applied first.
    pub fn withdraw(
        &mut self,
        account_no: &AccountNo,
        amount: Amount,
        minimum: Amount,
    ) -> Result<Amount> {
        if amount < minimum {
            return Err(LotteryError::BelowMinimumWithdrawal { amount, minimum });
        }
        self.debit(account_no, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            username: "ada".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    fn funded(balance: u32) -> (Ledger, AccountNo) {
        let mut ledger = Ledger::new();
        let account = ledger.register(registration("ada@example.com")).unwrap();
        if balance > 0 {
            ledger
                .credit(&account.account_no, Amount::from_major(balance))
                .unwrap();
        }
        (ledger, account.account_no)
    }

    #[test]
    fn test_register_and_authenticate() {
        let mut ledger = Ledger::new();
        let account = ledger.register(registration("ada@example.com")).unwrap();
        assert_eq!(account.balance, Amount::ZERO);
        assert_eq!(account.account_no.as_str().len(), AccountNo::LEN);

        assert!(ledger.authenticate(&account.account_no, "secret").is_ok());
        assert!(matches!(
            ledger.authenticate(&account.account_no, "wrong"),
            Err(LotteryError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut ledger = Ledger::new();
        ledger.register(registration("ada@example.com")).unwrap();
        assert!(matches!(
            ledger.register(registration("ADA@example.com")),
            Err(LotteryError::EmailAlreadyRegistered(_))
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut ledger = Ledger::new();
        let mut reg = registration("ada@example.com");
        reg.username = "  ".to_string();
        assert!(matches!(
            ledger.register(reg),
            Err(LotteryError::Validation(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let (mut ledger, acct) = funded(100);
        let err = ledger.debit(&acct, Amount::from_major(101)).unwrap_err();
        assert!(matches!(err, LotteryError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance(&acct).unwrap(), Amount::from_major(100));

        let left = ledger.debit(&acct, Amount::from_major(100)).unwrap();
        assert_eq!(left, Amount::ZERO);
    }

    #[test]
    fn test_credit_rejects_zero() {
        let (mut ledger, acct) = funded(0);
        assert!(matches!(
            ledger.credit(&acct, Amount::ZERO),
            Err(LotteryError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_unknown_account() {
        let mut ledger = Ledger::new();
        let ghost = AccountNo::parse("00000000000").unwrap();
        assert!(matches!(
            ledger.credit(&ghost, Amount::from_major(1)),
            Err(LotteryError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_withdraw_minimum() {
        let (mut ledger, acct) = funded(30_000);
        let minimum = Amount::from_major(20_000);

        assert!(matches!(
            ledger.withdraw(&acct, Amount::from_major(19_999), minimum),
            Err(LotteryError::BelowMinimumWithdrawal { .. })
        ));
        let left = ledger
            .withdraw(&acct, Amount::from_major(20_000), minimum)
            .unwrap();
        assert_eq!(left, Amount::from_major(10_000));
        assert!(matches!(
            ledger.withdraw(&acct, Amount::from_major(20_000), minimum),
            Err(LotteryError::InsufficientFunds { .. })
        ));
    }
}
