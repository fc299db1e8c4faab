/// Step-wise simulation of a finite-state machine.
pub trait Simulate {
    /// Simulates the finite-state machine from start to finish and returns whether it accepts the
    /// input.
    fn run(mut self, input: &str) -> bool
    where
        Self: Sized,
    {
        for c in input.chars() {
            self.feed(c);
            if !self.is_alive() {
                return false;
            }
        }

        self.is_accepting()
    }

    /// Returns whether the finite-state machine is in an accepting state.
    fn is_accepting(&self) -> bool;

    /// Returns whether there is at least one state the simulation is in.
    fn is_alive(&self) -> bool;

    /// Returns whether feeding `input` would keep the simulation alive.
    fn can_feed(&self, input: char) -> bool;

    /// Feeds a single character to the finite-state machine and returns whether it has reached an
    /// accepting state.
    fn feed(&mut self, input: char) -> bool;
}
