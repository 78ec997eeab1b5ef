use adorable_core::cache::{self, Cache};
use std::time::Duration;

type Pool = r2d2::Pool<redis::Client>;

/// A [`Cache`] backed by Redis, shared by all server processes.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

fn other<E>(err: E) -> cache::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    cache::Error::Other(anyhow::Error::new(err))
}

fn millis(d: Duration) -> u64 {
    // Redis rejects a zero expiry
    (d.as_millis() as u64).max(1)
}

impl RedisCache {
    pub fn connect(url: &str, pool_size: u32) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let pool = r2d2::Pool::builder().max_size(pool_size).build(client)?;
        log::info!("Connected to Redis with a pool of {pool_size} connection(s)");
        Ok(Self { pool })
    }

    fn conn(&self) -> cache::Result<r2d2::PooledConnection<redis::Client>> {
        self.pool.get().map_err(other)
    }
}

impl Cache for RedisCache {
    fn get(&self, key: &str) -> cache::Result<Option<String>> {
        redis::cmd("GET")
            .arg(key)
            .query(&mut *self.conn()?)
            .map_err(other)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> cache::Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        cmd.query(&mut *self.conn()?).map_err(other)
    }

    fn incr_by(&self, key: &str, delta: i64) -> cache::Result<i64> {
        redis::cmd("INCRBY")
            .arg(key)
            .arg(delta)
            .query(&mut *self.conn()?)
            .map_err(|err| {
                if err.kind() == redis::ErrorKind::ResponseError {
                    cache::Error::NotAnInteger
                } else {
                    other(err)
                }
            })
    }

    fn expire(&self, key: &str, ttl: Duration) -> cache::Result<()> {
        redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query::<i64>(&mut *self.conn()?)
            .map(|_| ())
            .map_err(other)
    }

    fn ttl(&self, key: &str) -> cache::Result<Option<Duration>> {
        let ttl: i64 = redis::cmd("PTTL")
            .arg(key)
            .query(&mut *self.conn()?)
            .map_err(other)?;
        // -1: no expiry, -2: missing key
        Ok((ttl >= 0).then(|| Duration::from_millis(ttl as u64)))
    }

    fn delete(&self, key: &str) -> cache::Result<()> {
        redis::cmd("DEL")
            .arg(key)
            .query::<i64>(&mut *self.conn()?)
            .map(|_| ())
            .map_err(other)
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>) -> cache::Result<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        let res: Option<String> = cmd.query(&mut *self.conn()?).map_err(other)?;
        Ok(res.is_some())
    }

    fn ping(&self) -> cache::Result<()> {
        let pong: String = redis::cmd("PING")
            .query(&mut *self.conn()?)
            .map_err(other)?;
        if pong != "PONG" {
            return Err(cache::Error::Other(anyhow::anyhow!(
                "Unexpected ping response: {pong}"
            )));
        }
        Ok(())
    }
}
