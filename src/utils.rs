/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;

    /// Log the wall-clock time taken by successive steps of a long job
    pub struct Progress {
        previous: Instant,
        message: String,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now(), message: String::new() } }

        /// Log message with ellipsis, start timer.
        pub fn start(&mut self, message: &str) {
            log::info!("{message} ...");
            self.message = message.to_string();
            self.start_timer();
        }

        /// Log the time elapsed since last start or done
        pub fn done(&mut self) {
            log::info!("{} ... done in {} ms", self.message, group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        /// Log message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            log::info!("{message}: {} ms", group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_grouped() {
        assert_eq!(group_digits(1234567), "1,234,567");
        assert_eq!(group_digits(12), "12");
    }
}
