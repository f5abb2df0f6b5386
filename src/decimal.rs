use super::*;

/// A non-negative decimal token amount, as entered by users.
#[derive(Debug, PartialEq, Copy, Clone, Default, DeserializeFromStr, SerializeDisplay)]
pub struct Decimal {
  pub value: u128,
  pub scale: u8,
}

impl Decimal {
  /// Scale to an integer amount of base units of a token with `decimals`
  /// decimal places.
  pub fn to_integer(self, decimals: u8) -> anyhow::Result<u128> {
    match decimals.checked_sub(self.scale) {
      Some(difference) => Ok(
        self
          .value
          .checked_mul(
            10u128
              .checked_pow(u32::from(difference))
              .context("decimals out of range")?,
          )
          .context("amount out of range")?,
      ),
      None => bail!("excessive precision"),
    }
  }

  /// Inverse of `to_integer`.
  pub fn from_integer(mut value: u128, decimals: u8) -> Self {
    let mut scale = decimals;

    while scale > 0 && value % 10 == 0 {
      value /= 10;
      scale -= 1;
    }

    Self { value, scale }
  }
}

impl Display for Decimal {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let scale = usize::from(self.scale);

    let digits = format!("{:0>width$}", self.value, width = scale + 1);

    let (integer, fraction) = digits.split_at(digits.len() - scale);

    write!(f, "{integer}")?;

    let fraction = fraction.trim_end_matches('0');

    if !fraction.is_empty() {
      write!(f, ".{fraction}")?;
    }

    Ok(())
  }
}

impl FromStr for Decimal {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let Some((integer, decimal)) = s.split_once('.') else {
      return Ok(Self {
        value: s.parse::<u128>()?,
        scale: 0,
      });
    };

    if integer.is_empty() && decimal.is_empty() {
      bail!("empty decimal");
    }

    let integer = if integer.is_empty() {
      0
    } else {
      integer.parse::<u128>()?
    };

    let (decimal, scale) = if decimal.is_empty() {
      (0, 0)
    } else {
      let trailing_zeros = decimal.chars().rev().take_while(|c| *c == '0').count();
      let significant_digits = decimal.chars().count() - trailing_zeros;
      let decimal = decimal.parse::<u128>()? / 10u128.pow(u32::try_from(trailing_zeros)?);
      (decimal, u8::try_from(significant_digits)?)
    };

    let value = 10u128
      .checked_pow(u32::from(scale))
      .and_then(|magnitude| integer.checked_mul(magnitude))
      .and_then(|integer| integer.checked_add(decimal))
      .context("amount out of range")?;

    Ok(Self { value, scale })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_str() {
    #[track_caller]
    fn case(s: &str, value: u128, scale: u8) {
      assert_eq!(s.parse::<Decimal>().unwrap(), Decimal { value, scale });
    }

    assert_eq!(
      ".".parse::<Decimal>().unwrap_err().to_string(),
      "empty decimal",
    );

    assert_eq!(
      "a.b".parse::<Decimal>().unwrap_err().to_string(),
      "invalid digit found in string",
    );

    assert_eq!(
      "-1".parse::<Decimal>().unwrap_err().to_string(),
      "invalid digit found in string",
    );

    case("0", 0, 0);
    case("0.00000", 0, 0);
    case("1.0", 1, 0);
    case("1.1", 11, 1);
    case("1.", 1, 0);
    case(".1", 1, 1);
    case("1.10", 11, 1);
    case("12.34", 1234, 2);
  }

  #[test]
  fn to_integer() {
    #[track_caller]
    fn case(s: &str, decimals: u8, amount: u128) {
      assert_eq!(
        s.parse::<Decimal>().unwrap().to_integer(decimals).unwrap(),
        amount,
      );
    }

    assert_eq!(
      Decimal { value: 0, scale: 0 }
        .to_integer(255)
        .unwrap_err()
        .to_string(),
      "decimals out of range"
    );

    assert_eq!(
      Decimal {
        value: u128::MAX,
        scale: 0,
      }
      .to_integer(1)
      .unwrap_err()
      .to_string(),
      "amount out of range",
    );

    assert_eq!(
      "1.5".parse::<Decimal>().unwrap().to_integer(0).unwrap_err().to_string(),
      "excessive precision",
    );

    case("1", 0, 1);
    case("1.0", 1, 10);
    case("12.34", 2, 1234);
    case("123.456", 6, 123456000);
    case("2.5", 18, 2_500_000_000_000_000_000);
  }

  #[test]
  fn integer_round_trip() {
    #[track_caller]
    fn case(s: &str, decimals: u8) {
      let amount = s.parse::<Decimal>().unwrap().to_integer(decimals).unwrap();
      let decimal = Decimal::from_integer(amount, decimals);
      assert_eq!(decimal.to_string(), s);
      assert_eq!(decimal.to_integer(decimals).unwrap(), amount);
    }

    case("12.34", 2);
    case("12.34", 8);
    case("1000", 2);
    case("0.001", 3);
    case("0", 18);
  }

  #[test]
  fn to_string() {
    #[track_caller]
    fn case(decimal: Decimal, string: &str) {
      assert_eq!(decimal.to_string(), string);
      assert_eq!(decimal, string.parse::<Decimal>().unwrap());
    }

    case(Decimal { value: 0, scale: 0 }, "0");
    case(Decimal { value: 1, scale: 1 }, "0.1");
    case(
      Decimal {
        value: 101,
        scale: 2,
      },
      "1.01",
    );
    case(
      Decimal {
        value: 1234,
        scale: 6,
      },
      "0.001234",
    );
  }

  #[test]
  fn scale_beyond_u128_magnitude() {
    assert_eq!(
      Decimal::from_integer(1, 40).to_string(),
      format!("0.{}1", "0".repeat(39)),
    );
    assert_eq!(
      Decimal::from_integer(u128::MAX, 255).to_string(),
      format!("0.{}{}", "0".repeat(255 - 39), u128::MAX),
    );
  }
}
