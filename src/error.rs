use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Raffle account already holds an initialized raffle
    #[error("Raffle is already initialized")]
    RaffleAlreadyInitialized,

    /// Raffle account has not been initialized
    #[error("Raffle is not initialized")]
    RaffleNotInitialized,

    /// Entrance fee or interval is zero
    #[error("Entrance fee and interval must be greater than zero")]
    InvalidConfiguration,

    /// Entries are only accepted while the round is open
    #[error("Raffle is not open for entries")]
    RaffleNotOpen,

    /// Attached amount is below the configured entrance fee
    #[error("Attached amount is below the entrance fee")]
    InsufficientEntryFee,

    /// The player list has reached the capacity the account was sized for
    #[error("Raffle has reached its player capacity")]
    RaffleFull,

    /// Upkeep conditions do not hold at this time
    #[error("Upkeep is not needed")]
    UpkeepNotNeeded,

    /// Request id does not match the pending randomness request
    #[error("Unknown or stale randomness request")]
    UnknownOrStaleRequest,

    /// Fulfillment must be signed by the configured VRF authority
    #[error("Randomness fulfillment not signed by the VRF authority")]
    UnauthorizedVrfAuthority,

    /// Fulfillment carried no random words
    #[error("Fulfillment carried no random words")]
    EmptyRandomWords,

    /// Winner account does not match the drawn player
    #[error("Winner account does not match the drawn player")]
    WinnerAccountMismatch,

    /// Prize transfer to the winner could not be completed
    #[error("Prize payout could not be completed")]
    PayoutFailed,

    /// Arithmetic overflow while updating balances
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
