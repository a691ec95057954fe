use crate::draw::DrawState;
use crate::error::{LotteryError, Result};
use crate::ledger::Ledger;
use crate::numbers::{Selection, PICK_COUNT};
use crate::payout::{self, BetResult};
use crate::types::{AccountNo, Amount, BetId, DrawId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub account_no: AccountNo,
    pub numbers: Selection,
    pub stake: Amount,
    pub placed_at: DateTime<Utc>,
    pub status: BetStatus,
    pub result: Option<BetResult>,
    pub winnings: Amount,
    pub draw_id: Option<DrawId>,
}

impl Bet {
    pub fn is_pending(&self) -> bool {
        self.status == BetStatus::Pending
    }
}

/// What settlement decided for one bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetOutcome {
    pub draw_id: DrawId,
    pub result: BetResult,
    pub winnings: Amount,
}

/// Bets grouped per account, each group in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BetBook {
    bets: BTreeMap<AccountNo, Vec<Bet>>,
    index: HashMap<BetId, (AccountNo, usize)>,
}

impl BetBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(bets: BTreeMap<AccountNo, Vec<Bet>>) -> Self {
        let index = bets
            .iter()
            .flat_map(|(account_no, list)| {
                list.iter()
                    .enumerate()
                    .map(move |(pos, bet)| (bet.id, (account_no.clone(), pos)))
            })
            .collect();
        Self { bets, index }
    }

    pub fn snapshot(&self) -> &BTreeMap<AccountNo, Vec<Bet>> {
        &self.bets
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Validates and records a bet, debiting the stake. Nothing changes on
    /// rejection.
    pub fn submit(
        &mut self,
        ledger: &mut Ledger,
        account_no: &AccountNo,
        numbers: &[u8],
        stake: Amount,
        min_stake: Amount,
        window: DrawState,
    ) -> Result<BetId> {
        let numbers = Selection::new(numbers)?;

        if stake < min_stake {
            return Err(LotteryError::BelowMinimumStake {
                stake,
                minimum: min_stake,
            });
        }

        // the jackpot on this stake must be representable
        payout::payout(stake, PICK_COUNT)?;

        if window != DrawState::Open {
            return Err(LotteryError::WindowNotOpen);
        }

        ledger.debit(account_no, stake)?;

        let bet = Bet {
            id: BetId::new(),
            account_no: account_no.clone(),
            numbers,
            stake,
            placed_at: Utc::now(),
            status: BetStatus::Pending,
            result: None,
            winnings: Amount::ZERO,
            draw_id: None,
        };
        let bet_id = bet.id;

        let list = self.bets.entry(account_no.clone()).or_default();
        self.index.insert(bet_id, (account_no.clone(), list.len()));
        list.push(bet);

        tracing::info!(
            "Account {} placed bet {} on [{}] for {}",
            account_no,
            bet_id,
            numbers,
            stake
        );
        Ok(bet_id)
    }

    pub fn get(&self, bet_id: &BetId) -> Option<&Bet> {
        let (account_no, pos) = self.index.get(bet_id)?;
        self.bets.get(account_no).and_then(|list| list.get(*pos))
    }

    pub fn pending_snapshot(&self) -> Vec<Bet> {
        self.bets
            .values()
            .flatten()
            .filter(|bet| bet.is_pending())
            .cloned()
            .collect()
    }

    pub fn bets_for_account(&self, account_no: &AccountNo) -> &[Bet] {
        self.bets
            .get(account_no)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_bet(&self, account_no: &AccountNo) -> Option<&Bet> {
        self.bets_for_account(account_no).last()
    }

    /// Writes the settlement fields. A bet can be resolved only once.
    pub fn resolve(&mut self, bet_id: &BetId, outcome: BetOutcome) -> Result<&Bet> {
        let (account_no, pos) = self
            .index
            .get(bet_id)
            .ok_or_else(|| LotteryError::internal(format!("Unknown bet {}", bet_id)))?;
        let bet = self
            .bets
            .get_mut(account_no)
            .and_then(|list| list.get_mut(*pos))
            .ok_or_else(|| LotteryError::internal(format!("Bet index out of sync for {}", bet_id)))?;

        if !bet.is_pending() {
            return Err(LotteryError::AlreadySettled(*bet_id));
        }

        bet.status = if outcome.winnings.is_zero() {
            BetStatus::Lost
        } else {
            BetStatus::Won
        };
        bet.winnings = outcome.winnings;
        bet.result = Some(outcome.result);
        bet.draw_id = Some(outcome.draw_id);
        Ok(&*bet)
    }
}
