//! Prime number helpers used when sizing shifted traversal designs.

/// Check whether `number` is prime.
pub fn is_prime(number: usize) -> bool {
    if number <= 1 {
        return false;
    }
    let mut div = 2;
    while div * div <= number {
        if number % div == 0 {
            return false;
        }
        div += 1;
    }
    true
}

/// Smallest prime greater than or equal to `number`.
pub fn prime_at_or_above(number: usize) -> usize {
    let mut candidate = number.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Smallest prime strictly greater than `number`.
pub fn next_prime(number: usize) -> usize {
    prime_at_or_above(number + 1)
}
