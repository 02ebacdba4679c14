//! Mock Wallet Client
//!
//! For testing and demo purposes. Keeps native and ERC-20 balances in memory
//! and applies `transfer`/`approve` calldata to them.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::WalletClient;
use crate::abi::{self, Word};
use crate::error::{Result, WalletError};
use crate::model::{Address, Chain, TransactionRequest};

#[derive(Default)]
struct Ledger {
    native: HashMap<Address, u128>,
    tokens: HashMap<(Address, Address), u128>,
    allowances: HashMap<(Address, Address, Address), u128>,
    sent: Vec<TransactionRequest>,
}

/// Balances of both sides after a transfer, not yet written back
struct Move {
    from: (Address, u128),
    to: (Address, u128),
}

impl Ledger {
    fn plan(
        from: Address,
        to: Address,
        balances: impl Fn(Address) -> u128,
        amount: u128,
    ) -> Result<Move> {
        let available = balances(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(WalletError::InsufficientFunds {
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(Move {
                from: (from, available),
                to: (to, available),
            });
        }
        let credited = balances(to)
            .checked_add(amount)
            .ok_or_else(|| WalletError::InvalidAmount(format!("balance of {to} overflows")))?;
        Ok(Move {
            from: (from, remaining),
            to: (to, credited),
        })
    }

    fn native_move(&self, from: Address, to: Address, amount: u128) -> Result<Move> {
        Self::plan(from, to, |a| self.native.get(&a).copied().unwrap_or(0), amount)
    }

    fn token_move(&self, token: Address, from: Address, to: Address, amount: u128) -> Result<Move> {
        Self::plan(
            from,
            to,
            |a| self.tokens.get(&(token, a)).copied().unwrap_or(0),
            amount,
        )
    }
}

/// In-memory wallet with scripted balances
pub struct MockWalletClient {
    address: Address,
    chain_id: u64,
    ledger: Mutex<Ledger>,
}

impl MockWalletClient {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            chain_id: Chain::BASE.id,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    #[must_use]
    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    #[must_use]
    pub fn with_native_balance(mut self, owner: Address, amount: u128) -> Self {
        self.ledger.get_mut().native.insert(owner, amount);
        self
    }

    #[must_use]
    pub fn with_token_balance(mut self, token: Address, owner: Address, amount: u128) -> Self {
        self.ledger.get_mut().tokens.insert((token, owner), amount);
        self
    }

    /// Transactions sent so far, oldest first
    pub async fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.ledger.lock().await.sent.clone()
    }

    fn word_address(words: &[Word], index: usize) -> Result<Address> {
        words
            .get(index)
            .ok_or_else(|| WalletError::Decode(format!("missing argument {index}")))
            .and_then(abi::decode_address)
    }

    fn word_uint(words: &[Word], index: usize) -> Result<u128> {
        words
            .get(index)
            .ok_or_else(|| WalletError::Decode(format!("missing argument {index}")))
            .and_then(|w| abi::decode_uint(w))
    }

    fn reverted(reason: &str) -> WalletError {
        WalletError::Rpc {
            code: 3,
            message: format!("execution reverted: {reason}"),
        }
    }
}

#[async_trait]
impl WalletClient for MockWalletClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn balance(&self, address: Address) -> Result<u128> {
        Ok(self
            .ledger
            .lock()
            .await
            .native
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        let token = request.to.ok_or_else(|| Self::reverted("call without target"))?;
        let (selector, words) = abi::decode_call(&request.data)?;
        let ledger = self.ledger.lock().await;

        let value = match selector {
            abi::BALANCE_OF => {
                let owner = Self::word_address(&words, 0)?;
                ledger.tokens.get(&(token, owner)).copied().unwrap_or(0)
            }
            abi::ALLOWANCE => {
                let owner = Self::word_address(&words, 0)?;
                let spender = Self::word_address(&words, 1)?;
                ledger
                    .allowances
                    .get(&(token, owner, spender))
                    .copied()
                    .unwrap_or(0)
            }
            _ => return Err(Self::reverted("unknown selector")),
        };

        Ok(abi::uint_word(value).to_vec())
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let mut ledger = self.ledger.lock().await;
        let from = self.address;

        // Nothing is written until every leg has been checked
        let native = if request.value > 0 {
            let to = request.to.ok_or_else(|| Self::reverted("value without target"))?;
            Some(ledger.native_move(from, to, request.value)?)
        } else {
            None
        };

        let mut token_move = None;
        let mut approval = None;
        if let (Some(token), Ok((selector, words))) = (request.to, abi::decode_call(&request.data))
        {
            match selector {
                abi::TRANSFER => {
                    let to = Self::word_address(&words, 0)?;
                    let amount = Self::word_uint(&words, 1)?;
                    token_move = Some((token, ledger.token_move(token, from, to, amount)?));
                }
                abi::APPROVE => {
                    let spender = Self::word_address(&words, 0)?;
                    let amount = Self::word_uint(&words, 1)?;
                    approval = Some(((token, from, spender), amount));
                }
                _ => {}
            }
        }

        if let Some(mv) = native {
            ledger.native.insert(mv.from.0, mv.from.1);
            ledger.native.insert(mv.to.0, mv.to.1);
        }
        if let Some((token, mv)) = token_move {
            ledger.tokens.insert((token, mv.from.0), mv.from.1);
            ledger.tokens.insert((token, mv.to.0), mv.to.1);
        }
        if let Some((key, amount)) = approval {
            ledger.allowances.insert(key, amount);
        }

        ledger.sent.push(request.clone());
        let hash = format!("0x{:064x}", ledger.sent.len());
        tracing::info!(hash = %hash, "Mock transaction applied");
        Ok(hash)
    }

    fn name(&self) -> &str {
        "MockWallet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from_bytes(bytes)
    }

    #[tokio::test]
    async fn test_token_transfer_moves_balances() {
        let token = addr(0xee);
        let wallet = MockWalletClient::new(addr(1)).with_token_balance(token, addr(1), 1_000);

        let hash = wallet
            .send_transaction(&TransactionRequest::call(token, abi::transfer(addr(2), 400)))
            .await
            .unwrap();

        assert_eq!(hash.len(), 66);
        assert_eq!(wallet.token_balance(token, addr(1)).await.unwrap(), 600);
        assert_eq!(wallet.token_balance(token, addr(2)).await.unwrap(), 400);
        assert_eq!(wallet.sent_transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected() {
        let token = addr(0xee);
        let wallet = MockWalletClient::new(addr(1)).with_token_balance(token, addr(1), 10);

        let result = wallet
            .send_transaction(&TransactionRequest::call(token, abi::transfer(addr(2), 11)))
            .await;

        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds {
                needed: 11,
                available: 10
            })
        ));
        assert!(wallet.sent_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_token_leg_keeps_native_balance() {
        let token = addr(0xee);
        let wallet = MockWalletClient::new(addr(1))
            .with_native_balance(addr(1), 1_000)
            .with_token_balance(token, addr(1), 5);
        let request = TransactionRequest {
            to: Some(token),
            value: 400,
            data: abi::transfer(addr(2), 10),
        };

        let result = wallet.send_transaction(&request).await;

        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds {
                needed: 10,
                available: 5
            })
        ));
        assert_eq!(wallet.balance(addr(1)).await.unwrap(), 1_000);
        assert_eq!(wallet.balance(token).await.unwrap(), 0);
        assert_eq!(wallet.token_balance(token, addr(1)).await.unwrap(), 5);
        assert!(wallet.sent_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_credit_overflow_is_rejected() {
        let wallet = MockWalletClient::new(addr(1))
            .with_native_balance(addr(1), 10)
            .with_native_balance(addr(2), u128::MAX);

        let result = wallet
            .send_transaction(&TransactionRequest::native_transfer(addr(2), 1))
            .await;

        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
        assert_eq!(wallet.balance(addr(1)).await.unwrap(), 10);
        assert!(wallet.sent_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_approve_sets_allowance() {
        let token = addr(0xee);
        let wallet = MockWalletClient::new(addr(1));

        wallet
            .send_transaction(&TransactionRequest::call(token, abi::approve(addr(3), 55)))
            .await
            .unwrap();

        assert_eq!(
            wallet.token_allowance(token, addr(1), addr(3)).await.unwrap(),
            55
        );
        assert_eq!(wallet.token_allowance(token, addr(1), addr(4)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_native_balance_and_chain() {
        let wallet = MockWalletClient::new(addr(1))
            .on_chain(Chain::BASE_SEPOLIA.id)
            .with_native_balance(addr(1), 5);

        assert_eq!(wallet.balance(addr(1)).await.unwrap(), 5);
        assert_eq!(wallet.balance(addr(9)).await.unwrap(), 0);
        assert_eq!(wallet.chain_id().await.unwrap(), 84532);
    }
}
