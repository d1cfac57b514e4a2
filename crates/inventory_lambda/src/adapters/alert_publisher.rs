pub trait AlertPublisher {
    fn publish(&self, subject: &str, message: &str) -> Result<(), String>;
}
