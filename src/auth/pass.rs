use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Algorithm, Argon2, Params, Version,
};

use crate::error::*;

pub const PWD_ALGORITHM: Algorithm = Algorithm::Argon2id;
pub const PWD_VERSION: Version = Version::V0x13;

// If the hasher params change, stored hashes get rehashed on the next login.
lazy_static! {
  pub static ref HASHER: Argon2<'static> = {
    Argon2::new(PWD_ALGORITHM, PWD_VERSION, Params::default())
  };
}

#[derive(Debug)]
pub struct CheckedPass {
  pub is_valid: bool,
  pub needs_update: bool,
}

impl CheckedPass {
  pub fn new(is_valid: bool, needs_update: bool) -> Self {
    Self {
      is_valid, needs_update
    }
  }
}

fn needs_update(stored: &PasswordHash) -> bool {
  if stored.algorithm != PWD_ALGORITHM.ident() {
    return true;
  }
  if stored.version != Some(PWD_VERSION.into()) {
    return true;
  }
  match Params::try_from(stored) {
    Ok(params) => {
      let current = HASHER.params();
      params.m_cost() != current.m_cost()
        || params.t_cost() != current.t_cost()
        || params.p_cost() != current.p_cost()
    },
    Err(_) => true,
  }
}

pub fn check_password(stored: &str, password: &str) -> Result<CheckedPass> {
  let checker = PasswordHash::new(stored)?;
  if HASHER.verify_password(password.as_bytes(), &checker).is_ok() {
    Ok(CheckedPass::new(true, needs_update(&checker)))
  } else {
    Ok(CheckedPass::new(false, false))
  }
}

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(HASHER.hash_password(password.as_bytes(), &salt)?.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_and_check() {
    let hash = hash_password("secret1").unwrap();
    assert!(hash.starts_with("$argon2id$"));

    let res = check_password(&hash, "secret1").unwrap();
    assert!(res.is_valid);
    assert!(!res.needs_update);

    let res = check_password(&hash, "secret2").unwrap();
    assert!(!res.is_valid);
  }

  #[test]
  fn salts_are_random() {
    assert_ne!(hash_password("secret1").unwrap(), hash_password("secret1").unwrap());
  }

  #[test]
  fn older_params_need_update() {
    let weak = Argon2::new(PWD_ALGORITHM, PWD_VERSION, Params::new(8 * 1024, 1, 1, None).unwrap());
    let salt = SaltString::generate(&mut OsRng);
    let hash = weak.hash_password(b"secret1", &salt).unwrap().to_string();

    let res = check_password(&hash, "secret1").unwrap();
    assert!(res.is_valid);
    assert!(res.needs_update);
  }

  #[test]
  fn garbage_hash_is_an_error() {
    assert!(check_password("not a hash", "secret1").is_err());
  }
}
