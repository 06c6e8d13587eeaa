use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;

#[derive(Debug, serde::Serialize)]
pub struct Context {
    pub title: String,
    pub users: Vec<User>,
}

#[derive(Debug, serde::Serialize)]
pub struct User {
    pub name: String,
    pub age: u32,
    pub is_disabled: bool,
}

/// Generates a context with `n` randomly named users.
pub fn random(n: usize) -> Context {
    let mut rng = rand::thread_rng();
    let title = Alphanumeric.sample_string(&mut rng, 20);
    let mut users = Vec::with_capacity(n);
    for _ in 0..n {
        users.push(User {
            name: Alphanumeric.sample_string(&mut rng, 12),
            age: rng.gen_range(21..100),
            is_disabled: rng.gen_ratio(1, 4),
        });
    }
    Context { title, users }
}
