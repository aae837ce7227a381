mod health;
mod rate_limit;
mod support;
