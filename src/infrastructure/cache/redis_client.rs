// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, FromRedisValue, RedisResult, Script};
use std::collections::{HashMap, HashSet};

/// Redis客户端
///
/// 持有一个多路复用连接，克隆开销很小，可在所有worker之间共享
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// 会立即建立连接并发送PING，连接失败直接返回错误
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    pub async fn new(redis_url: &str) -> RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        let _: () = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(Self { connection })
    }

    fn con(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// 向集合添加多个成员，返回新增数量
    pub async fn sadd(&self, key: &str, members: &[String]) -> RedisResult<usize> {
        if members.is_empty() {
            return Ok(0);
        }
        self.con().sadd(key, members).await
    }

    /// 判断集合成员
    pub async fn sismember(&self, key: &str, member: &str) -> RedisResult<bool> {
        self.con().sismember(key, member).await
    }

    /// 从集合删除成员，返回删除数量
    pub async fn srem(&self, key: &str, member: &str) -> RedisResult<usize> {
        self.con().srem(key, member).await
    }

    /// 读取集合全部成员
    pub async fn smembers(&self, key: &str) -> RedisResult<HashSet<String>> {
        self.con().smembers(key).await
    }

    /// 集合元素个数
    pub async fn scard(&self, key: &str) -> RedisResult<usize> {
        self.con().scard(key).await
    }

    /// 写入哈希的多个字段
    pub async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> RedisResult<()> {
        self.con().hset_multiple::<_, _, _, ()>(key, fields).await
    }

    /// 读取哈希全部字段
    pub async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>> {
        self.con().hgetall(key).await
    }

    pub async fn hget(&self, key: &str, field: &str) -> RedisResult<Option<String>> {
        self.con().hget(key, field).await
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> RedisResult<()> {
        self.con().hset::<_, _, _, ()>(key, field, value).await
    }

    pub async fn hdel(&self, key: &str, field: &str) -> RedisResult<()> {
        self.con().hdel::<_, _, ()>(key, field).await
    }

    /// 追加到列表尾部
    pub async fn rpush(&self, key: &str, value: &str) -> RedisResult<()> {
        self.con().rpush::<_, _, ()>(key, value).await
    }

    /// 从列表头部弹出一个元素
    pub async fn lpop(&self, key: &str) -> RedisResult<Option<String>> {
        self.con().lpop(key, None).await
    }

    /// 写入有序集合
    pub async fn zadd(&self, key: &str, member: &str, score: i64) -> RedisResult<()> {
        self.con().zadd::<_, _, _, ()>(key, member, score).await
    }

    /// 读取分数不大于 `max` 的最多 `count` 个成员
    pub async fn zrange_due(&self, key: &str, max: i64, count: isize) -> RedisResult<Vec<String>> {
        self.con()
            .zrangebyscore_limit(key, "-inf", max, 0, count)
            .await
    }

    /// 从有序集合删除成员，返回删除数量
    pub async fn zrem(&self, key: &str, member: &str) -> RedisResult<usize> {
        self.con().zrem(key, member).await
    }

    /// 原子执行Lua脚本
    pub async fn run_script<T: FromRedisValue>(
        &self,
        script: &Script,
        keys: &[&str],
        args: &[&str],
    ) -> RedisResult<T> {
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(*key);
        }
        for arg in args {
            invocation.arg(*arg);
        }
        invocation.invoke_async(&mut self.con()).await
    }

    /// 删除匹配模式的所有键，返回删除数量
    pub async fn delete_matching(&self, pattern: &str) -> RedisResult<usize> {
        let mut con = self.con();
        let keys: Vec<String> = con.keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        con.del(keys).await
    }
}
