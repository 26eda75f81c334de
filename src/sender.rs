//! The demonstration program: five greetings and a goodbye

use crate::logging::LoggerRepository;

/// Name the program's logger is registered under
pub const LOGGER_NAME: &str = "sender";

/// Number of greetings logged at INFO
pub const GREETINGS: usize = 5;

/// Log `Hello 0` through `Hello 4` at INFO, then `Bye` at DEBUG
pub fn run(repository: &LoggerRepository) {
    let logger = repository.get_logger(LOGGER_NAME);

    (0..GREETINGS).for_each(|i| logger.info(format!("Hello {}", i)));
    logger.debug("Bye");

    repository.flush();
}
