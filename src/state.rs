// SolLotto Raffle Program - State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

/// Round state of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness request in flight, entries rejected
    Calculating,
}

/// Result of evaluating the upkeep conditions. Each condition is reported
/// individually; upkeep is due only when all four hold at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpkeepStatus {
    /// Round state is Open
    pub is_open: bool,
    /// At least `interval` seconds have passed since the last settlement
    pub interval_elapsed: bool,
    /// At least one player has entered this round
    pub has_players: bool,
    /// The prize pool holds funds
    pub has_balance: bool,
}

impl UpkeepStatus {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.interval_elapsed && self.has_players && self.has_balance
    }
}

/// Raffle account data
///
/// Space calculation:
/// 1 (is_initialized) +
/// 32 (authority) +
/// 32 (vrf_authority) +
/// 32 (key_hash) +
/// 8 (subscription_id) +
/// 4 (callback_gas_limit) +
/// 8 (entrance_fee) +
/// 8 (interval) +
/// 8 (last_timestamp) +
/// 1 (state) +
/// 8 (prize_pool) +
/// 8 (request_counter) +
/// 9 (pending_request: Option<u64>) +
/// 33 (recent_winner: Option<Pubkey>) +
/// 4 + 32 * MAX_PLAYERS (players) =
/// 196 + 32 * MAX_PLAYERS bytes
#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Creator of the raffle
    pub authority: Pubkey,
    /// Oracle key whose signature is accepted on randomness fulfillment
    pub vrf_authority: Pubkey,
    /// Oracle key hash used when requesting randomness
    pub key_hash: [u8; 32],
    /// Oracle subscription funding the randomness requests
    pub subscription_id: u64,
    /// Gas limit granted to the fulfillment callback
    pub callback_gas_limit: u32,
    /// Minimum amount a player must attach to enter, in lamports
    pub entrance_fee: u64,
    /// Seconds between settlements
    pub interval: i64,
    /// Construction time, then the time of the last settlement
    pub last_timestamp: UnixTimestamp,
    /// Current round state
    pub state: RaffleState,
    /// Sum of all attached entry amounts this round, in lamports
    pub prize_pool: u64,
    /// Monotonically increasing source of request ids
    pub request_counter: u64,
    /// Correlation token of the in-flight randomness request, if any
    pub pending_request: Option<u64>,
    /// Winner of the last settled round
    pub recent_winner: Option<Pubkey>,
    /// Players of the current round, in entry order; duplicates allowed
    pub players: Vec<Pubkey>,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Player capacity the account is sized for
    pub const MAX_PLAYERS: usize = 200;

    /// Fixed account size; the serialized form never exceeds this
    pub const ACCOUNT_SIZE: usize = 196 + 32 * Self::MAX_PLAYERS;

    /// Deserialize from account data, tolerating the trailing pad of the
    /// fixed-size buffer
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let mut data = data;
        Self::deserialize(&mut data).map_err(|_| ProgramError::InvalidAccountData)
    }

    /// Evaluate all four upkeep conditions at the given time
    pub fn upkeep_status(&self, now: UnixTimestamp) -> UpkeepStatus {
        UpkeepStatus {
            is_open: self.state == RaffleState::Open,
            interval_elapsed: now.saturating_sub(self.last_timestamp) >= self.interval,
            has_players: !self.players.is_empty(),
            has_balance: self.prize_pool > 0,
        }
    }

    pub fn num_players(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn player(&self, index: u64) -> Option<&Pubkey> {
        self.players.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_raffle() -> Raffle {
        Raffle {
            is_initialized: true,
            authority: Pubkey::new_unique(),
            vrf_authority: Pubkey::new_unique(),
            key_hash: [7; 32],
            subscription_id: 1,
            callback_gas_limit: 500_000,
            entrance_fee: 100_000_000,
            interval: 30,
            last_timestamp: 1_000,
            state: RaffleState::Open,
            prize_pool: 100_000_000,
            request_counter: 0,
            pending_request: None,
            recent_winner: None,
            players: vec![Pubkey::new_unique()],
        }
    }

    #[test]
    fn upkeep_needed_when_all_conditions_hold() {
        let raffle = open_raffle();
        let status = raffle.upkeep_status(1_030);
        assert!(status.is_open);
        assert!(status.interval_elapsed);
        assert!(status.has_players);
        assert!(status.has_balance);
        assert!(status.upkeep_needed());
    }

    #[test]
    fn upkeep_waits_for_the_interval() {
        let raffle = open_raffle();
        let status = raffle.upkeep_status(1_029);
        assert!(!status.interval_elapsed);
        assert!(status.is_open && status.has_players && status.has_balance);
        assert!(!status.upkeep_needed());
    }

    #[test]
    fn upkeep_requires_players() {
        let mut raffle = open_raffle();
        raffle.players.clear();
        let status = raffle.upkeep_status(1_030);
        assert!(!status.has_players);
        assert!(status.is_open && status.interval_elapsed && status.has_balance);
        assert!(!status.upkeep_needed());
    }

    #[test]
    fn upkeep_requires_a_funded_pool() {
        let mut raffle = open_raffle();
        raffle.prize_pool = 0;
        let status = raffle.upkeep_status(1_030);
        assert!(!status.has_balance);
        assert!(status.is_open && status.interval_elapsed && status.has_players);
        assert!(!status.upkeep_needed());
    }

    #[test]
    fn upkeep_requires_an_open_round() {
        let mut raffle = open_raffle();
        raffle.state = RaffleState::Calculating;
        let status = raffle.upkeep_status(1_030);
        assert!(!status.is_open);
        assert!(status.interval_elapsed && status.has_players && status.has_balance);
        assert!(!status.upkeep_needed());
    }

    #[test]
    fn unpack_tolerates_account_pad() {
        let raffle = open_raffle();
        let mut buf = vec![0u8; Raffle::ACCOUNT_SIZE];
        raffle
            .serialize(&mut buf.as_mut_slice())
            .expect("serialize into sized buffer");
        let loaded = Raffle::unpack(&buf).expect("unpack padded buffer");
        assert_eq!(loaded.state, RaffleState::Open);
        assert_eq!(loaded.players, raffle.players);
        assert_eq!(loaded.prize_pool, raffle.prize_pool);
        assert_eq!(loaded.pending_request, None);
    }

    #[test]
    fn unpack_of_zeroed_account_is_uninitialized() {
        let buf = vec![0u8; Raffle::ACCOUNT_SIZE];
        let loaded = Raffle::unpack(&buf).expect("zeroed buffer is a valid default");
        assert!(!loaded.is_initialized);
        assert!(loaded.players.is_empty());
    }
}
