// SolLotto Raffle Program - Instruction Processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, Sysvar},
};

use crate::{
    error::RaffleError,
    instruction::RaffleInstruction,
    state::{Raffle, RaffleState},
    vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    program_id,
                )
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: i64,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let vrf_authority_info = next_account_info(account_info_iter)?;
        let clock_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        if raffle_info.data_len() < Raffle::ACCOUNT_SIZE {
            msg!("Raffle account needs {} bytes", Raffle::ACCOUNT_SIZE);
            return Err(ProgramError::AccountDataTooSmall);
        }

        let existing = Raffle::unpack(&raffle_info.data.borrow())?;
        if existing.is_initialized {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::RaffleAlreadyInitialized.into());
        }

        if entrance_fee == 0 || interval <= 0 {
            msg!("Entrance fee and interval must be greater than zero");
            return Err(RaffleError::InvalidConfiguration.into());
        }

        let clock = Clock::from_account_info(clock_info)?;

        let raffle = Raffle {
            is_initialized: true,
            authority: *authority_info.key,
            vrf_authority: *vrf_authority_info.key,
            key_hash,
            subscription_id,
            callback_gas_limit,
            entrance_fee,
            interval,
            last_timestamp: clock.unix_timestamp,
            state: RaffleState::Open,
            prize_pool: 0,
            request_counter: 0,
            pending_request: None,
            recent_winner: None,
            players: Vec::new(),
        };

        raffle.serialize(&mut *raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: fee={} lamports, interval={}s, vrf_authority={}",
            entrance_fee,
            interval,
            vrf_authority_info.key
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            return Err(RaffleError::RaffleNotInitialized.into());
        }

        // Entries are rejected for the whole stretch between the randomness
        // request and its fulfillment.
        if raffle.state != RaffleState::Open {
            msg!("Raffle is calculating a winner, entries are closed");
            return Err(RaffleError::RaffleNotOpen.into());
        }

        if amount < raffle.entrance_fee {
            msg!(
                "Attached {} lamports, entrance fee is {}",
                amount,
                raffle.entrance_fee
            );
            return Err(RaffleError::InsufficientEntryFee.into());
        }

        if raffle.players.len() >= Raffle::MAX_PLAYERS {
            msg!("Raffle already holds {} players", raffle.players.len());
            return Err(RaffleError::RaffleFull.into());
        }

        // Move the attached amount into the prize pool held by the raffle
        // account.
        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.players.push(*player_info.key);
        raffle.prize_pool = raffle
            .prize_pool
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        raffle.serialize(&mut *raffle_info.data.borrow_mut())?;

        msg!(
            "EntryRecorded: player={} amount={} total_players={}",
            player_info.key,
            amount,
            raffle.players.len()
        );
        Ok(())
    }

    /// Read-only evaluation of the upkeep conditions. The automation
    /// trigger may also compute the same answer off-chain from a fetched
    /// raffle account; PerformUpkeep never trusts either result and
    /// re-checks internally.
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let clock_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            return Err(RaffleError::RaffleNotInitialized.into());
        }

        let clock = Clock::from_account_info(clock_info)?;
        let status = raffle.upkeep_status(clock.unix_timestamp);

        msg!(
            "CheckUpkeep: is_open={} interval_elapsed={} has_players={} has_balance={} upkeep_needed={}",
            status.is_open,
            status.interval_elapsed,
            status.has_players,
            status.has_balance,
            status.upkeep_needed()
        );
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let trigger_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let clock_info = next_account_info(account_info_iter)?;

        // Anyone can trigger upkeep (fully decentralized approach)
        if !trigger_info.is_signer {
            msg!("Trigger must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            return Err(RaffleError::RaffleNotInitialized.into());
        }

        let clock = Clock::from_account_info(clock_info)?;

        // Re-evaluate the conditions here; a delayed or duplicated trigger
        // must not be able to force a draw.
        let status = raffle.upkeep_status(clock.unix_timestamp);
        if !status.upkeep_needed() {
            msg!(
                "UpkeepNotNeeded: balance={} players={} state={:?}",
                raffle.prize_pool,
                raffle.players.len(),
                raffle.state
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        raffle.state = RaffleState::Calculating;
        raffle.request_counter = raffle
            .request_counter
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        let request_id = raffle.request_counter;
        raffle.pending_request = Some(request_id);

        raffle.serialize(&mut *raffle_info.data.borrow_mut())?;

        // The request id logged here is the only handle the oracle and any
        // external watcher have to correlate the later fulfillment.
        msg!(
            "WinnerRequested: request_id={} key_hash={} subscription_id={} confirmations={} callback_gas_limit={} num_words={}",
            request_id,
            Pubkey::new_from_array(raffle.key_hash),
            raffle.subscription_id,
            vrf::REQUEST_CONFIRMATIONS,
            raffle.callback_gas_limit,
            vrf::NUM_WORDS
        );
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[vrf::RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let vrf_authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;
        let clock_info = next_account_info(account_info_iter)?;

        if !vrf_authority_info.is_signer {
            msg!("VRF authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            return Err(RaffleError::RaffleNotInitialized.into());
        }

        // Only the oracle registered at initialization may deliver words.
        if *vrf_authority_info.key != raffle.vrf_authority {
            msg!("Fulfillment signed by {}", vrf_authority_info.key);
            return Err(RaffleError::UnauthorizedVrfAuthority.into());
        }

        // The single pending token is what stops stale or duplicate
        // callbacks from double-settling a round.
        if raffle.state != RaffleState::Calculating
            || raffle.pending_request != Some(request_id)
        {
            msg!(
                "Request {} does not match pending request {:?}",
                request_id,
                raffle.pending_request
            );
            return Err(RaffleError::UnknownOrStaleRequest.into());
        }

        let word = random_words
            .first()
            .ok_or(RaffleError::EmptyRandomWords)?;

        let total_players = raffle.num_players();
        let index = vrf::winner_index(word, total_players);
        let winner = raffle
            .player(index)
            .copied()
            .ok_or(ProgramError::InvalidAccountData)?;

        if *winner_info.key != winner {
            msg!("Drawn winner is {}, got account {}", winner, winner_info.key);
            return Err(RaffleError::WinnerAccountMismatch.into());
        }

        // Pay out the whole pool. A failure here aborts the instruction and
        // the runtime rolls everything back, so the round stays Calculating
        // with the pool intact and the oracle can retry.
        let prize = raffle.prize_pool;
        let raffle_balance = raffle_info.lamports();
        let winner_balance = winner_info.lamports();
        **raffle_info.lamports.borrow_mut() = raffle_balance
            .checked_sub(prize)
            .ok_or(RaffleError::PayoutFailed)?;
        **winner_info.lamports.borrow_mut() = winner_balance
            .checked_add(prize)
            .ok_or(RaffleError::PayoutFailed)?;

        let clock = Clock::from_account_info(clock_info)?;

        // Settlement reset: winner recorded, list cleared, pool zeroed,
        // token consumed, window restarted, round reopened.
        raffle.recent_winner = Some(winner);
        raffle.players.clear();
        raffle.prize_pool = 0;
        raffle.pending_request = None;
        raffle.last_timestamp = clock.unix_timestamp;
        raffle.state = RaffleState::Open;

        raffle.serialize(&mut *raffle_info.data.borrow_mut())?;

        msg!(
            "WinnerPicked: winner={} prize={} request_id={}",
            winner,
            prize,
            request_id
        );
        Ok(())
    }
}
