fn main() {
  cat20::main();
}
