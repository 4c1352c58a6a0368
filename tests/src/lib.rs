//! Host-side integration tests for the PPM receiver

#[cfg(test)]
mod decode_scenarios;
#[cfg(test)]
mod concurrency_tests;
#[cfg(test)]
mod consumer_task_tests;
