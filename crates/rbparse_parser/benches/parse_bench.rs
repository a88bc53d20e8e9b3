use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rbparse_core::ParserArena;
use rbparse_diagnostics::Warnings;
use rbparse_parser::{ParserConfiguration, RubyParser, RubyTables};

// A medium-size Ruby source with various constructs
const RUBY_SOURCE: &str = r#"
# Account bookkeeping
module Bank
  class InsufficientFunds < StandardError; end

  class Account
    attr_reader :owner, :balance

    def initialize(owner, balance = 0, *tags)
      @owner = owner
      @balance = balance
      @tags = tags
      @history = []
    end

    def deposit(amount)
      raise ArgumentError, "amount must be positive" unless amount > 0
      @balance += amount
      @history << [:deposit, amount]
      self
    end

    def withdraw(amount)
      if amount > @balance
        raise InsufficientFunds, "balance #{@balance} below #{amount}"
      elsif amount <= 0
        raise ArgumentError
      else
        @balance -= amount
        @history << [:withdraw, amount]
      end
      self
    end

    def each_entry
      @history.each do |kind, amount|
        yield kind, amount
      end
    end

    def summary
      totals = Hash.new(0)
      each_entry { |kind, amount| totals[kind] += amount }
      totals.map { |k, v| "#{k}: #{v}" }.join(", ")
    end

    def self.open(owner, &block)
      account = new(owner)
      block.call(account) if block
      account
    rescue InsufficientFunds => e
      warn e.message
      nil
    ensure
      $stdout.flush
    end
  end
end

accounts = %w(alice bob carol).map { |name| Bank::Account.new(name, 100) }
accounts.each_with_index do |account, i|
  case i
  when 0 then account.deposit(50)
  when 1, 2 then account.withdraw(10 * i)
  else
    next
  end
end

total = 0
i = 0
while i < accounts.size
  total += accounts[i].balance
  i += 1
end
puts "total: #{total}" if total > 0
"#;

fn bench_tables(c: &mut Criterion) {
    c.bench_function("build ruby tables", |b| {
        b.iter(|| {
            let tables = RubyTables::build().unwrap();
            black_box(tables.tables.stats.states);
        });
    });
}

fn bench_parse(c: &mut Criterion) {
    // Build the shared tables outside the measurement.
    RubyTables::get().unwrap();
    let config = ParserConfiguration::default();
    c.bench_function("parse medium ruby", |b| {
        let mut parser = RubyParser::new();
        b.iter(|| {
            let arena = ParserArena::new();
            let mut sink = Warnings::new(false);
            let result = parser
                .parse("bench.rb", black_box(RUBY_SOURCE), &config, &mut sink, &arena)
                .unwrap();
            black_box(result.local_variable_names.len());
        });
    });
}

criterion_group!(benches, bench_tables, bench_parse);
criterion_main!(benches);
