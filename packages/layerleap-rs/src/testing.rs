//! Scriptable in-memory wallet for unit tests
//!
//! Records every request it receives and answers from configurable state.

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::contracts::{ILayerLeapBridge, ILayerZeroEndpoint, IMailbox};
use crate::error::WalletError;
use crate::wallet::{AddChainParams, CallRequest, WalletClient, WalletEvent};

pub const TEST_ACCOUNT: Address = Address::new([0xaa; 20]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletRequest {
    Accounts,
    RequestAccounts,
    ChainId,
    NetVersion,
    SwitchChain(u64),
    AddChain(u64),
    Balance(Address),
    Call(CallRequest),
    EstimateGas(CallRequest),
    SendTransaction(CallRequest),
    TransactionStatus(TxHash),
}

struct MockState {
    chain_id: Result<u64, WalletError>,
    /// `None` follows `chain_id`
    net_version: Option<Result<u64, WalletError>>,
    accounts: Vec<Address>,
    requestable_accounts: Result<Vec<Address>, WalletError>,
    balance: U256,
    known_chains: HashSet<u64>,
    switch_error: Option<WalletError>,
    add_chain_error: Option<WalletError>,
    call_responses: HashMap<[u8; 4], Bytes>,
    call_errors: HashMap<[u8; 4], WalletError>,
    call_failures: VecDeque<WalletError>,
    gas: Result<u64, WalletError>,
    send_failures: VecDeque<WalletError>,
    sent: u8,
    receipts: HashMap<TxHash, Option<bool>>,
    /// Applied, with its event, when the next `eth_call` arrives
    pending_change: Option<WalletEvent>,
    requests: Vec<WalletRequest>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    /// Wallet on `chain_id` with one authorized account holding 100 ETH
    pub fn on_chain(chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        let wallet = Self {
            state: Mutex::new(MockState {
                chain_id: Ok(chain_id),
                net_version: None,
                accounts: vec![TEST_ACCOUNT],
                requestable_accounts: Ok(vec![TEST_ACCOUNT]),
                balance: U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)),
                known_chains: HashSet::from([chain_id]),
                switch_error: None,
                add_chain_error: None,
                call_responses: HashMap::new(),
                call_errors: HashMap::new(),
                call_failures: VecDeque::new(),
                gas: Ok(100_000),
                send_failures: VecDeque::new(),
                sent: 0,
                receipts: HashMap::new(),
                pending_change: None,
                requests: Vec::new(),
            }),
            events,
        };
        wallet.set_route_supported(true);
        wallet
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn requests(&self) -> Vec<WalletRequest> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn count(&self, pred: impl Fn(&WalletRequest) -> bool) -> usize {
        self.with_state(|s| s.requests.iter().filter(|r| pred(r)).count())
    }

    pub fn set_chain_id(&self, chain_id: Result<u64, WalletError>) {
        self.with_state(|s| s.chain_id = chain_id);
    }

    pub fn set_net_version(&self, net_version: Result<u64, WalletError>) {
        self.with_state(|s| s.net_version = Some(net_version));
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with_state(|s| s.accounts = accounts);
    }

    pub fn set_requestable_accounts(&self, accounts: Result<Vec<Address>, WalletError>) {
        self.with_state(|s| s.requestable_accounts = accounts);
    }

    pub fn set_balance(&self, balance: U256) {
        self.with_state(|s| s.balance = balance);
    }

    pub fn add_known_chain(&self, chain_id: u64) {
        self.with_state(|s| s.known_chains.insert(chain_id));
    }

    pub fn fail_switch(&self, err: WalletError) {
        self.with_state(|s| s.switch_error = Some(err));
    }

    pub fn fail_add_chain(&self, err: WalletError) {
        self.with_state(|s| s.add_chain_error = Some(err));
    }

    /// Answer every protocol's fee-quote call with `fee`
    pub fn set_quote(&self, fee: U256) {
        let pair = [fee.to_be_bytes::<32>(), U256::ZERO.to_be_bytes::<32>()].concat();
        self.with_state(|s| {
            s.call_responses.insert(
                ILayerLeapBridge::estimateFeeCall::SELECTOR,
                Bytes::from(pair.clone()),
            );
            s.call_responses.insert(
                ILayerZeroEndpoint::estimateFeesCall::SELECTOR,
                Bytes::from(pair),
            );
            s.call_responses.insert(
                IMailbox::quoteDispatchCall::SELECTOR,
                Bytes::copy_from_slice(&fee.to_be_bytes::<32>()),
            );
        });
    }

    /// Answer every `eth_call` to `selector` with `data`
    pub fn respond(&self, selector: [u8; 4], data: Vec<u8>) {
        self.with_state(|s| s.call_responses.insert(selector, Bytes::from(data)));
    }

    /// Answer the bridge's `isChainSupported` for every chain
    pub fn set_route_supported(&self, supported: bool) {
        self.respond(
            ILayerLeapBridge::isChainSupportedCall::SELECTOR,
            ILayerLeapBridge::isChainSupportedCall::abi_encode_returns(&(supported,)),
        );
    }

    /// Fail `eth_call` for one selector on every attempt
    pub fn revert_selector(&self, selector: [u8; 4], err: WalletError) {
        self.with_state(|s| s.call_errors.insert(selector, err));
    }

    /// Fail the next `times` calls of any kind
    pub fn fail_calls(&self, times: usize, err: WalletError) {
        self.with_state(|s| s.call_failures.extend(std::iter::repeat(err).take(times)));
    }

    pub fn set_gas(&self, gas: Result<u64, WalletError>) {
        self.with_state(|s| s.gas = gas);
    }

    /// Fail the next `times` sends
    pub fn fail_sends(&self, times: usize, err: WalletError) {
        self.with_state(|s| s.send_failures.extend(std::iter::repeat(err).take(times)));
    }

    /// Switch the wallet to `accounts` while the next call is in flight
    pub fn change_accounts_on_next_call(&self, accounts: Vec<Address>) {
        self.with_state(|s| s.pending_change = Some(WalletEvent::AccountsChanged(accounts)));
    }

    /// Switch the wallet to `chain_id` while the next call is in flight
    pub fn change_chain_on_next_call(&self, chain_id: u64) {
        self.with_state(|s| s.pending_change = Some(WalletEvent::ChainChanged(chain_id)));
    }

    pub fn set_receipt(&self, hash: TxHash, status: Option<bool>) {
        self.with_state(|s| s.receipts.insert(hash, status));
    }

    /// Hash the mock assigns to its `n`th successful send (1-based)
    pub fn sent_hash(n: u8) -> TxHash {
        B256::with_last_byte(n)
    }

    fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletClient for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::Accounts);
            Ok(s.accounts.clone())
        })
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::RequestAccounts);
            s.requestable_accounts.clone()
        })
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::ChainId);
            s.chain_id.clone()
        })
    }

    async fn net_version(&self) -> Result<u64, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::NetVersion);
            s.net_version.clone().unwrap_or_else(|| s.chain_id.clone())
        })
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let result = self.with_state(|s| {
            s.requests.push(WalletRequest::SwitchChain(chain_id));
            if let Some(err) = s.switch_error.clone() {
                return Err(err);
            }
            if !s.known_chains.contains(&chain_id) {
                return Err(WalletError::ChainNotAdded { chain_id });
            }
            s.chain_id = Ok(chain_id);
            s.net_version = None;
            Ok(())
        });
        if result.is_ok() {
            self.emit(WalletEvent::ChainChanged(chain_id));
        }
        result
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError> {
        self.with_state(|s| {
            let chain_id = params.numeric_chain_id().unwrap_or_default();
            s.requests.push(WalletRequest::AddChain(chain_id));
            if let Some(err) = s.add_chain_error.clone() {
                return Err(err);
            }
            s.known_chains.insert(chain_id);
            Ok(())
        })
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::Balance(address));
            Ok(s.balance)
        })
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, WalletError> {
        let change = self.with_state(|s| {
            let change = s.pending_change.take();
            match &change {
                Some(WalletEvent::AccountsChanged(accounts)) => s.accounts = accounts.clone(),
                Some(WalletEvent::ChainChanged(chain_id)) => {
                    s.chain_id = Ok(*chain_id);
                    s.net_version = None;
                }
                None => {}
            }
            change
        });
        if let Some(event) = change {
            self.emit(event);
        }

        self.with_state(|s| {
            s.requests.push(WalletRequest::Call(request.clone()));
            if let Some(err) = s.call_failures.pop_front() {
                return Err(err);
            }
            let selector: Option<[u8; 4]> = request
                .data
                .get(..4)
                .and_then(|b| b.try_into().ok());
            let Some(selector) = selector else {
                return Ok(Bytes::new());
            };
            if let Some(err) = s.call_errors.get(&selector) {
                return Err(err.clone());
            }
            Ok(s.call_responses.get(&selector).cloned().unwrap_or_default())
        })
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::EstimateGas(request.clone()));
            s.gas.clone()
        })
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<TxHash, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::SendTransaction(request.clone()));
            if let Some(err) = s.send_failures.pop_front() {
                return Err(err);
            }
            s.sent += 1;
            Ok(Self::sent_hash(s.sent))
        })
    }

    async fn transaction_status(&self, hash: TxHash) -> Result<Option<bool>, WalletError> {
        self.with_state(|s| {
            s.requests.push(WalletRequest::TransactionStatus(hash));
            Ok(s.receipts.get(&hash).copied().flatten())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
