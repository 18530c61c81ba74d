use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
    sysvar::clock,
};

use arrayref::array_ref;

use crate::error::RaffleError;
use crate::vrf::RandomWord;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Initialize a new raffle
    ///
    /// Accounts expected:
    /// 0. `[signer]` The authority/creator of the raffle
    /// 1. `[writable]` The raffle account, program-owned and uninitialized
    /// 2. `[]` The oracle authority accepted on randomness fulfillment
    /// 3. `[]` The clock sysvar
    InitializeRaffle {
        /// Minimum amount a player must attach to enter, in lamports
        entrance_fee: u64,
        /// Seconds between settlements
        interval: i64,
        /// Oracle key hash used when requesting randomness
        key_hash: [u8; 32],
        /// Oracle subscription funding the randomness requests
        subscription_id: u64,
        /// Gas limit granted to the fulfillment callback
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player entering (pays the attached amount)
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Amount attached to the entry, in lamports
        amount: u64,
    },

    /// Evaluate the upkeep conditions and log each one. Read-only; callable
    /// any number of times by the automation trigger.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    /// 1. `[]` The clock sysvar
    CheckUpkeep {},

    /// Start settlement: re-check upkeep, close the round to entries and
    /// issue a randomness request (step 1 of settlement)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any user (fully decentralized - anyone can trigger)
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The clock sysvar
    PerformUpkeep {},

    /// Deliver the oracle's random words and settle the round (step 2 of
    /// settlement). Only the raffle's VRF authority may invoke this.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The VRF authority registered with the raffle
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The winner (must be the player at the drawn index)
    /// 3. `[]` The clock sysvar
    FulfillRandomWords {
        /// Correlation token returned when the request was issued
        request_id: u64,
        /// Oracle-provided random words; the first word picks the winner
        random_words: Vec<RandomWord>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (key_hash, rest) = Self::unpack_bytes32(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (word_count, mut rest) = Self::unpack_u32(rest)?;
                let mut random_words = Vec::new();
                for _ in 0..word_count {
                    let (word, tail) = Self::unpack_bytes32(rest)?;
                    random_words.push(word);
                    rest = tail;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match *self {
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                ref key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                ref random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(word);
                }
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        Ok((u64::from_le_bytes(*array_ref![input, 0, 8]), &input[8..]))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        Ok((i64::from_le_bytes(*array_ref![input, 0, 8]), &input[8..]))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        Ok((u32::from_le_bytes(*array_ref![input, 0, 4]), &input[4..]))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        if input.len() < 32 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        Ok((*array_ref![input, 0, 32], &input[32..]))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    raffle_account: &Pubkey,
    vrf_authority: &Pubkey,
    entrance_fee: u64,
    interval: i64,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(*vrf_authority, false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(
    program_id: &Pubkey,
    raffle_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*raffle_account, false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    trigger: &Pubkey,
    raffle_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*trigger, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    vrf_authority: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*vrf_authority, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new(*winner, false),
        AccountMeta::new_readonly(clock::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_round_trips_through_the_wire_format() {
        let cases = vec![
            RaffleInstruction::InitializeRaffle {
                entrance_fee: 100_000_000,
                interval: 30,
                key_hash: [9; 32],
                subscription_id: 7,
                callback_gas_limit: 500_000,
            },
            RaffleInstruction::EnterRaffle { amount: 250_000_000 },
            RaffleInstruction::CheckUpkeep {},
            RaffleInstruction::PerformUpkeep {},
            RaffleInstruction::FulfillRandomWords {
                request_id: 3,
                random_words: vec![[1; 32], [2; 32]],
            },
        ];
        for expected in cases {
            let unpacked = RaffleInstruction::unpack(&expected.pack()).expect("unpack");
            assert_eq!(unpacked, expected);
        }
    }

    #[test]
    fn rejects_unknown_tags_and_truncated_data() {
        assert!(RaffleInstruction::unpack(&[]).is_err());
        assert!(RaffleInstruction::unpack(&[99]).is_err());
        assert!(RaffleInstruction::unpack(&[1, 0, 0]).is_err());
    }
}
